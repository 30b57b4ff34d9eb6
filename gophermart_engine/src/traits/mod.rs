//! # Backend and collaborator contracts
//!
//! * [`LedgerManagement`] is the order ledger: debit entries for submitted orders, credit entries for withdrawals, and
//!   the balance derived from them.
//! * [`AuthManagement`] stores user credentials.
//! * [`AccrualSource`] is where the reconciliation worker gets accrual verdicts from. In production this is the
//!   external accrual service, via [`accrual_tools::AccrualApi`].
mod accrual_source;
mod auth_management;
mod ledger_management;

pub use accrual_source::AccrualSource;
pub use auth_management::{AuthApiError, AuthManagement};
pub use ledger_management::{LedgerError, LedgerManagement, StatusUpdate};
