//! A thin client for the external accrual service.
//!
//! The accrual service is owned by somebody else. It tells us, for a given order number, whether the order earns
//! loyalty points and how many. The only endpoint we use is `GET /api/orders/{number}`.
//!
//! [`AccrualApi::fetch_order`] never treats a non-200 status as an error. Rate limiting, server failures and other
//! statuses are all normal outcomes that the caller has to schedule around, so they come back as [`AccrualReply`]
//! variants. Only transport and decoding failures produce an [`AccrualApiError`].
mod api;
mod config;
mod data_objects;
mod error;

pub use api::AccrualApi;
pub use config::{normalize_base_url, AccrualConfig};
pub use data_objects::{AccrualOrder, AccrualReply, AccrualStatus};
pub use error::AccrualApiError;
