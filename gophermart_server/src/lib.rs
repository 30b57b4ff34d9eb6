//! # Gophermart server
//!
//! The HTTP front end of the gophermart loyalty service. It is responsible for:
//! * Registering and logging in users, and issuing their session tokens.
//! * Accepting order numbers and withdrawal requests, and reporting balances and history.
//! * Running the accrual reconciliation worker pool for as long as the server is up.
//!
//! ## Configuration
//! The server is configured via environment variables, some of which can be overridden on the command line. See
//! [config](config/index.html) and [cli](cli/index.html).
//!
//! ## Routes
//! * `/health`: returns 200 OK.
//! * `/api/user/register`, `/api/user/login`: obtain a session token.
//! * `/api/user/orders`: submit (POST) and list (GET) orders.
//! * `/api/user/balance`, `/api/user/balance/withdraw`, `/api/user/withdrawals`: spend points and review spending.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
