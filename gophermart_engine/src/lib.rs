//! Gophermart Engine
//!
//! The engine holds everything the gophermart loyalty service does that is not HTTP plumbing. It is storage-agnostic:
//! backends implement the traits in [`mod@traits`], and everything else talks to those traits.
//!
//! The library is divided into these sections:
//! 1. The order ledger. Every order a user submits is a *debit* entry in the ledger, and every withdrawal is a *credit*
//!    entry with a negative amount. A user's balance is the sum over their entries. [`SqliteDatabase`] is the
//!    production backend; [`MemoryDatabase`] keeps everything in process and is used for tests and throwaway runs.
//! 2. The public API ([`OrderFlowApi`], [`AccountApi`], [`AuthApi`]). These validate input and apply the business
//!    rules on top of a backend.
//! 3. The reconciliation worker ([`mod@reconciliation`]). Orders are settled by an external accrual service. The
//!    worker pool polls that service for every pending order and writes the verdicts back into the ledger.
//!
//! The engine also emits events (an order was submitted, an order was reconciled) that other components can subscribe
//! to. This is how freshly submitted orders reach the reconciliation queue without waiting for the next sweep.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod gm_api;
pub mod reconciliation;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use db::memory::MemoryDatabase;
#[cfg(feature = "sqlite")]
pub use db::sqlite::{create_database_if_missing, SqliteDatabase};
pub use gm_api::{
    accounts_api::AccountApi,
    auth_api::AuthApi,
    errors::{AccountError, AuthError, OrderFlowError},
    order_flow_api::OrderFlowApi,
    order_objects,
};
pub use traits::{AccrualSource, AuthApiError, AuthManagement, LedgerError, LedgerManagement};
