use std::collections::HashMap;

use chrono::Utc;

use crate::{
    db_types::{Balance, EntryKind, LedgerEntry, NewUser, OrderNumber, OrderStatusType, Points, Transition, User},
    order_objects::EntryQueryFilter,
    traits::{AuthApiError, LedgerError, StatusUpdate},
};

/// Entries and users are never deleted, so an entry's id is its arena index plus one.
#[derive(Default)]
pub(super) struct Arena {
    entries: Vec<LedgerEntry>,
    by_order_number: HashMap<OrderNumber, usize>,
    by_user: HashMap<i64, Vec<usize>>,
    users: Vec<User>,
    by_username: HashMap<String, usize>,
}

impl Arena {
    pub fn entry(&self, order_number: &OrderNumber) -> Option<&LedgerEntry> {
        self.by_order_number.get(order_number).map(|&i| &self.entries[i])
    }

    pub fn insert_debit(&mut self, user_id: i64, order_number: &OrderNumber) -> Result<LedgerEntry, LedgerError> {
        if let Some(existing) = self.entry(order_number) {
            return Err(LedgerError::conflict(existing, user_id));
        }
        Ok(self.push(user_id, order_number, EntryKind::Debit, OrderStatusType::New, Points::default()))
    }

    pub fn insert_credit(
        &mut self,
        user_id: i64,
        order_number: &OrderNumber,
        amount: Points,
    ) -> Result<LedgerEntry, LedgerError> {
        if self.entry(order_number).is_some() {
            return Err(LedgerError::OrderNumberInUse(order_number.clone()));
        }
        let available = self.balance(user_id).current;
        if available < amount {
            return Err(LedgerError::InsufficientBalance { available, requested: amount });
        }
        Ok(self.push(user_id, order_number, EntryKind::Credit, OrderStatusType::Withdrawn, -amount))
    }

    pub fn update_debit_status(
        &mut self,
        order_number: &OrderNumber,
        status: OrderStatusType,
        amount: Points,
    ) -> Result<StatusUpdate, LedgerError> {
        let index = match self.by_order_number.get(order_number) {
            Some(&i) if self.entries[i].kind == EntryKind::Debit => i,
            _ => return Err(LedgerError::OrderNotFound(order_number.clone())),
        };
        let entry = &mut self.entries[index];
        match entry.transition_to(status, amount) {
            Transition::Refuse => Ok(StatusUpdate::Ignored(entry.clone())),
            Transition::Unchanged => Ok(StatusUpdate::Unchanged(entry.clone())),
            Transition::Apply => {
                let previous = entry.status;
                entry.status = status;
                entry.amount = amount;
                entry.updated_at = Utc::now();
                Ok(StatusUpdate::Applied { previous, entry: entry.clone() })
            },
        }
    }

    pub fn search(&self, query: &EntryQueryFilter) -> Vec<LedgerEntry> {
        let matching = |e: &&LedgerEntry| query.matches(e);
        match query.user_id {
            Some(user_id) => self.user_entries(user_id).filter(matching).cloned().collect(),
            None => self.entries.iter().filter(matching).cloned().collect(),
        }
    }

    pub fn balance(&self, user_id: i64) -> Balance {
        self.user_entries(user_id).fold(Balance::default(), |mut balance, e| {
            balance.current += e.amount;
            if e.kind == EntryKind::Credit {
                balance.withdrawn -= e.amount;
            }
            balance
        })
    }

    pub fn insert_user(&mut self, user: NewUser) -> Result<User, AuthApiError> {
        if self.by_username.contains_key(&user.username) {
            return Err(AuthApiError::UserAlreadyExists(user.username));
        }
        let index = self.users.len();
        let user = User {
            id: index as i64 + 1,
            username: user.username,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        self.by_username.insert(user.username.clone(), index);
        self.users.push(user.clone());
        Ok(user)
    }

    pub fn user(&self, user_id: i64) -> Option<&User> {
        let index = usize::try_from(user_id).ok()?.checked_sub(1)?;
        self.users.get(index)
    }

    pub fn user_by_name(&self, username: &str) -> Option<&User> {
        self.by_username.get(username).map(|&i| &self.users[i])
    }

    fn user_entries(&self, user_id: i64) -> impl Iterator<Item = &LedgerEntry> {
        self.by_user.get(&user_id).into_iter().flatten().map(|&i| &self.entries[i])
    }

    fn push(
        &mut self,
        user_id: i64,
        order_number: &OrderNumber,
        kind: EntryKind,
        status: OrderStatusType,
        amount: Points,
    ) -> LedgerEntry {
        let index = self.entries.len();
        let now = Utc::now();
        let entry = LedgerEntry {
            id: index as i64 + 1,
            user_id,
            order_number: order_number.clone(),
            kind,
            status,
            amount,
            created_at: now,
            updated_at: now,
        };
        self.entries.push(entry.clone());
        self.by_order_number.insert(order_number.clone(), index);
        self.by_user.entry(user_id).or_default().push(index);
        entry
    }
}
