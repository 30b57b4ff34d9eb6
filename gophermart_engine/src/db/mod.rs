//! Ledger storage backends.
//!
//! Both backends implement [`crate::traits::LedgerManagement`] and [`crate::traits::AuthManagement`]. SQLite is the
//! production backend. The in-memory backend is meant for tests and throwaway runs; it loses everything on restart.
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
