//! Read-only views of a user's ledger.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{Balance, EntryKind, LedgerEntry, OrderNumber},
    traits::LedgerManagement,
    AccountError,
};

/// The `AccountApi` answers the "what do I have?" questions: orders, balance and withdrawals.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Every order the user has submitted, oldest first, whatever its status.
    pub async fn get_orders(&self, user_id: i64) -> Result<Vec<LedgerEntry>, AccountError> {
        let orders = self.db.list_by_kind(user_id, EntryKind::Debit).await?;
        trace!("👤️ User #{user_id} has {} orders", orders.len());
        Ok(orders)
    }

    pub async fn get_balance(&self, user_id: i64) -> Result<Balance, AccountError> {
        Ok(self.db.balance(user_id).await?)
    }

    /// Every withdrawal the user has made, oldest first.
    pub async fn get_withdrawals(&self, user_id: i64) -> Result<Vec<LedgerEntry>, AccountError> {
        let withdrawals = self.db.list_by_kind(user_id, EntryKind::Credit).await?;
        trace!("👤️ User #{user_id} has {} withdrawals", withdrawals.len());
        Ok(withdrawals)
    }

    /// Fetches a single entry, but only if it belongs to the user.
    pub async fn get_entry(&self, user_id: i64, order_number: &OrderNumber) -> Result<Option<LedgerEntry>, AccountError> {
        let entry = self.db.fetch_entry_by_order_number(order_number).await?;
        Ok(entry.filter(|e| e.user_id == user_id))
    }
}
