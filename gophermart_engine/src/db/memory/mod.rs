//! An in-memory ledger.
//!
//! All entries live in a single arena (a `Vec`), with hash indices pointing into it. A single async mutex guards the
//! arena, so every operation is trivially atomic, including the balance check that precedes a withdrawal.
mod arena;

use std::{fmt::Debug, sync::Arc};

use log::*;
use tokio::sync::Mutex;

use self::arena::Arena;
use crate::{
    db_types::{Balance, LedgerEntry, NewUser, OrderNumber, OrderStatusType, Points, User},
    order_objects::EntryQueryFilter,
    traits::{AuthApiError, AuthManagement, LedgerError, LedgerManagement, StatusUpdate},
};

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    arena: Arc<Mutex<Arena>>,
}

impl Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryDatabase")
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerManagement for MemoryDatabase {
    async fn insert_debit(&self, user_id: i64, order_number: &OrderNumber) -> Result<LedgerEntry, LedgerError> {
        let mut arena = self.arena.lock().await;
        let entry = arena.insert_debit(user_id, order_number)?;
        debug!("🗃️ Order {order_number} stored in memory for user #{user_id}");
        Ok(entry)
    }

    async fn insert_credit(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
        amount: Points,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut arena = self.arena.lock().await;
        let entry = arena.insert_credit(user_id, order_number, amount)?;
        debug!("🗃️ Withdrawal of {amount} against {order_number} stored in memory for user #{user_id}");
        Ok(entry)
    }

    async fn update_debit_status(
        &self,
        order_number: &OrderNumber,
        status: OrderStatusType,
        amount: Points,
    ) -> Result<StatusUpdate, LedgerError> {
        let mut arena = self.arena.lock().await;
        arena.update_debit_status(order_number, status, amount)
    }

    async fn fetch_entry_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<LedgerEntry>, LedgerError> {
        let arena = self.arena.lock().await;
        Ok(arena.entry(order_number).cloned())
    }

    async fn search_entries(&self, query: EntryQueryFilter) -> Result<Vec<LedgerEntry>, LedgerError> {
        let arena = self.arena.lock().await;
        Ok(arena.search(&query))
    }

    async fn balance(&self, user_id: i64) -> Result<Balance, LedgerError> {
        let arena = self.arena.lock().await;
        Ok(arena.balance(user_id))
    }
}

impl AuthManagement for MemoryDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut arena = self.arena.lock().await;
        arena.insert_user(user)
    }

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, AuthApiError> {
        let arena = self.arena.lock().await;
        Ok(arena.user_by_name(username).cloned())
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        let arena = self.arena.lock().await;
        Ok(arena.user(user_id).cloned())
    }
}
