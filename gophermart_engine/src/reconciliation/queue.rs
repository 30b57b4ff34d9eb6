use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use log::*;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::db_types::OrderNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    Queued,
    /// The order is already waiting in the queue, or a worker is polling it right now.
    AlreadyInFlight,
    /// The queue is at capacity. The next sweep will try again.
    Full,
}

/// A bounded multi-consumer queue of order numbers that refuses duplicates.
///
/// An order number counts as in flight from the moment it is queued until a worker calls [`OrderQueue::release`].
#[derive(Clone)]
pub struct OrderQueue {
    sender: mpsc::Sender<OrderNumber>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<OrderNumber>>>,
    in_flight: Arc<Mutex<HashSet<OrderNumber>>>,
}

impl OrderQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn try_enqueue(&self, order_number: OrderNumber) -> EnqueueResult {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        if in_flight.contains(&order_number) {
            return EnqueueResult::AlreadyInFlight;
        }
        match self.sender.try_send(order_number.clone()) {
            Ok(()) => {
                trace!("📥️ Order {order_number} queued for reconciliation");
                in_flight.insert(order_number);
                EnqueueResult::Queued
            },
            // The queue owns a sender, so it can never be closed
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                debug!("📥️ Reconciliation queue is full. Order {order_number} must wait for the next sweep");
                EnqueueResult::Full
            },
        }
    }

    /// Waits for the next order number. Only one consumer waits on the channel at a time; the others queue up on the
    /// receiver lock.
    pub async fn next(&self) -> Option<OrderNumber> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }

    /// Marks the order as no longer in flight, so it can be queued again.
    pub fn release(&self, order_number: &OrderNumber) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        in_flight.remove(order_number);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}
