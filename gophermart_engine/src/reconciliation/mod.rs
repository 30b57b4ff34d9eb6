//! # Accrual reconciliation
//!
//! Orders are settled by an external accrual service. This module keeps asking that service about every order that
//! is still `New` or `Processing`, and writes the answers back into the ledger.
//!
//! ```text
//!   submit_order ──(OrderSubmittedEvent)──┐
//!                                         ▼
//!   sweep (every few seconds) ──────► OrderQueue ──► worker 1..n ──► AccrualSource
//!                                                          │
//!                                                          ▼
//!                                                OrderFlowApi::reconcile
//! ```
//!
//! * The queue refuses numbers that are already queued or being polled, so the sweep and the eager path never make
//!   the pool poll the same order twice at the same time.
//! * The sweep lists every pending order. It is what guarantees progress: orders whose eager push was lost (a full
//!   queue, a restart) are picked up on the next pass.
//! * A `429` from the accrual service closes the [`BackpressureGate`] for the `Retry-After` period. Every worker waits
//!   on the gate before each request, so one 429 pauses the whole pool.
//! * Polling an order is bounded. `500`s, transport errors and unexpected replies end the cycle for that order
//!   immediately; otherwise it ends after `max_attempts` requests. Either way the sweep brings it back later.
mod gate;
mod queue;
mod worker;

pub use gate::BackpressureGate;
pub use queue::{EnqueueResult, OrderQueue};
pub use worker::{internal_status, PollOutcome, ReconciliationConfig, ReconciliationHandle, ReconciliationWorker};
