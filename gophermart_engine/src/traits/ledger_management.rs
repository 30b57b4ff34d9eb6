use std::future::Future;

use thiserror::Error;

use crate::{
    db_types::{Balance, EntryKind, LedgerEntry, OrderNumber, OrderStatusType, Points},
    order_objects::EntryQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} has already been submitted by this user")]
    AlreadyInsertedBySelf(OrderNumber),
    #[error("Order {0} has already been submitted by another user")]
    AlreadyInsertedByOther(OrderNumber),
    #[error("Order number {0} is already used by a withdrawal")]
    OrderNumberInUse(OrderNumber),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available")]
    InsufficientBalance { available: Points, requested: Points },
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

impl LedgerError {
    /// Works out why inserting `user_id`'s entry collided with `existing`.
    pub fn conflict(existing: &LedgerEntry, user_id: i64) -> Self {
        let number = existing.order_number.clone();
        match existing.kind {
            EntryKind::Credit => Self::OrderNumberInUse(number),
            EntryKind::Debit if existing.user_id == user_id => Self::AlreadyInsertedBySelf(number),
            EntryKind::Debit => Self::AlreadyInsertedByOther(number),
        }
    }
}

/// The result of a successful [`LedgerManagement::update_debit_status`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The entry was changed. `previous` is the status it held before.
    Applied { previous: OrderStatusType, entry: LedgerEntry },
    /// The entry already held this status and amount.
    Unchanged(LedgerEntry),
    /// The entry is already terminal and the update would have changed it, so it was dropped.
    Ignored(LedgerEntry),
}

impl StatusUpdate {
    pub fn entry(&self) -> &LedgerEntry {
        match self {
            StatusUpdate::Applied { entry, .. } => entry,
            StatusUpdate::Unchanged(entry) => entry,
            StatusUpdate::Ignored(entry) => entry,
        }
    }
}

/// The order ledger.
///
/// Every order a user submits becomes a *debit* entry, and every withdrawal becomes a *credit* entry. Order numbers are
/// unique across the whole ledger, whichever kind of entry they belong to.
///
/// A user's balance is derived from their entries alone:
/// * `current` is the sum of all amounts. Debits only carry a non-zero amount once they are `Processed`, and credits
///   are stored as negative amounts, so this is "settled accrual minus withdrawals".
/// * `withdrawn` is the sum of all credits, reported as a positive number.
///
/// Implementations must make the following atomic:
/// * inserting a debit and detecting that the order number is taken. This must rely on a uniqueness guarantee of the
///   storage, not on a read followed by a write.
/// * checking the balance and inserting a credit, relative to any other write for the same user.
pub trait LedgerManagement: Clone + Send + Sync + 'static {
    /// Records a newly submitted order as a `New` debit with a zero amount.
    ///
    /// If the order number is already taken, the error says by whom: [`LedgerError::AlreadyInsertedBySelf`],
    /// [`LedgerError::AlreadyInsertedByOther`], or [`LedgerError::OrderNumberInUse`] if a withdrawal used it.
    fn insert_debit(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
    ) -> impl Future<Output = Result<LedgerEntry, LedgerError>> + Send;

    /// Records a withdrawal of `amount` (a positive number) as a credit entry, provided the user's current balance
    /// covers it. Otherwise, [`LedgerError::InsufficientBalance`] is returned and nothing is written.
    fn insert_credit(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
        amount: Points,
    ) -> impl Future<Output = Result<LedgerEntry, LedgerError>> + Send;

    /// Sets the status and amount of a debit entry. This is a SET, so repeating an update is harmless.
    ///
    /// A terminal entry is never changed again; any differing update results in [`StatusUpdate::Ignored`].
    /// Credit entries, and order numbers that do not exist, result in [`LedgerError::OrderNotFound`].
    fn update_debit_status(
        &self,
        order_number: &OrderNumber,
        status: OrderStatusType,
        amount: Points,
    ) -> impl Future<Output = Result<StatusUpdate, LedgerError>> + Send;

    fn fetch_entry_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> impl Future<Output = Result<Option<LedgerEntry>, LedgerError>> + Send;

    /// Fetches the entries matching the filter, oldest first.
    fn search_entries(
        &self,
        query: EntryQueryFilter,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, LedgerError>> + Send;

    fn balance(&self, user_id: i64) -> impl Future<Output = Result<Balance, LedgerError>> + Send;

    /// Every entry for the user, oldest first.
    fn list_by_user(&self, user_id: i64) -> impl Future<Output = Result<Vec<LedgerEntry>, LedgerError>> + Send {
        self.search_entries(EntryQueryFilter::default().with_user_id(user_id))
    }

    /// Debit entries, across all users, that are still `New` or `Processing`.
    fn list_pending(&self) -> impl Future<Output = Result<Vec<LedgerEntry>, LedgerError>> + Send {
        self.search_entries(EntryQueryFilter::pending())
    }

    fn list_pending_by_user(&self, user_id: i64) -> impl Future<Output = Result<Vec<LedgerEntry>, LedgerError>> + Send {
        self.search_entries(EntryQueryFilter::pending().with_user_id(user_id))
    }

    fn list_by_kind(
        &self,
        user_id: i64,
        kind: EntryKind,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, LedgerError>> + Send {
        self.search_entries(EntryQueryFilter::default().with_user_id(user_id).with_kind(kind))
    }

    /// Releases any resources held by the backend.
    fn close(&mut self) -> impl Future<Output = Result<(), LedgerError>> + Send {
        async { Ok(()) }
    }
}
