use crate::db_types::{LedgerEntry, OrderStatusType};

/// A user submitted an order number that nobody had claimed before.
#[derive(Debug, Clone)]
pub struct OrderSubmittedEvent {
    pub entry: LedgerEntry,
}

/// The accrual verdict for an order changed its ledger entry.
#[derive(Debug, Clone)]
pub struct OrderReconciledEvent {
    pub previous_status: OrderStatusType,
    pub entry: LedgerEntry,
}
