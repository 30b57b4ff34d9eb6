use std::{fmt::Display, sync::Arc, time::Duration};

use accrual_tools::{AccrualReply, AccrualStatus};
use log::*;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{sleep, MissedTickBehavior},
};

use crate::{
    db_types::{OrderNumber, OrderStatusType, Points},
    reconciliation::{BackpressureGate, EnqueueResult, OrderQueue},
    traits::{AccrualSource, LedgerManagement},
    OrderFlowApi,
};

pub const DEFAULT_WORKERS: usize = 3;
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    /// Number of tasks polling the accrual service concurrently.
    pub workers: usize,
    /// How often every pending order is re-queued.
    pub sweep_interval: Duration,
    /// Requests per order per cycle, including rate-limited ones.
    pub max_attempts: u32,
    /// Delay between polls of an order the accrual service is still working on.
    pub poll_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// How a poll cycle for one order ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The order reached a terminal status.
    Settled(OrderStatusType),
    /// The accrual service could not help this time (server error, transport error, unexpected reply).
    Abandoned,
    /// The order was still pending after the maximum number of attempts.
    Exhausted,
}

impl Display for PollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollOutcome::Settled(status) => write!(f, "settled as {status}"),
            PollOutcome::Abandoned => write!(f, "abandoned until the next sweep"),
            PollOutcome::Exhausted => write!(f, "still pending after the maximum number of attempts"),
        }
    }
}

/// Maps the accrual service's vocabulary onto ours. `None` means we do not understand the status.
pub fn internal_status(status: AccrualStatus) -> Option<OrderStatusType> {
    match status {
        AccrualStatus::Registered | AccrualStatus::Processing => Some(OrderStatusType::Processing),
        AccrualStatus::Invalid => Some(OrderStatusType::Invalid),
        AccrualStatus::Processed => Some(OrderStatusType::Processed),
        AccrualStatus::Unknown => None,
    }
}

/// Polls the accrual service for pending orders and writes the verdicts into the ledger.
///
/// Build one with [`ReconciliationWorker::new`], then call [`ReconciliationWorker::start`] to spawn the pool and the
/// sweeper. The returned [`ReconciliationHandle`] stops them again.
pub struct ReconciliationWorker<B, A> {
    api: Arc<OrderFlowApi<B>>,
    source: A,
    queue: OrderQueue,
    gate: BackpressureGate,
    config: ReconciliationConfig,
}

impl<B, A> ReconciliationWorker<B, A>
where
    B: LedgerManagement,
    A: AccrualSource,
{
    pub fn new(api: Arc<OrderFlowApi<B>>, source: A, queue: OrderQueue, config: ReconciliationConfig) -> Self {
        Self { api, source, queue, gate: BackpressureGate::new(), config }
    }

    pub fn gate(&self) -> &BackpressureGate {
        &self.gate
    }

    pub fn queue(&self) -> &OrderQueue {
        &self.queue
    }

    /// Spawns the worker pool and the sweeper. The first sweep runs immediately, which picks up anything left
    /// pending by a previous run.
    pub fn start(self) -> ReconciliationHandle {
        let workers = self.config.workers.max(1);
        let queue = self.queue.clone();
        let gate = self.gate.clone();
        let worker = Arc::new(self);
        let (shutdown, rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(workers + 1);
        for id in 0..workers {
            tasks.push(tokio::spawn(Arc::clone(&worker).run_consumer(id, rx.clone())));
        }
        tasks.push(tokio::spawn(worker.run_sweeper(rx)));
        info!("🕰️ Accrual reconciliation started with {workers} workers");
        ReconciliationHandle { shutdown, tasks, queue, gate }
    }

    /// Queues every pending order that is not already in flight. Returns the number of orders queued.
    pub async fn sweep(&self) -> usize {
        let pending = match self.api.list_pending().await {
            Ok(pending) => pending,
            Err(e) => {
                error!("🕰️ Could not fetch pending orders for the sweep: {e}");
                return 0;
            },
        };
        let mut queued = 0;
        for entry in pending {
            match self.queue.try_enqueue(entry.order_number) {
                EnqueueResult::Queued => queued += 1,
                EnqueueResult::AlreadyInFlight => {},
                EnqueueResult::Full => {
                    warn!("🕰️ Reconciliation queue is full. The rest of this sweep is skipped");
                    break;
                },
            }
        }
        queued
    }

    /// Runs one bounded poll cycle for a single order.
    ///
    /// Never returns an error: every failure is logged, and leaves the order for a later cycle.
    pub async fn poll_order(&self, order_number: &OrderNumber) -> PollOutcome {
        for attempt in 1..=self.config.max_attempts {
            self.gate.wait_until_open().await;
            trace!("🕰️ Asking for the accrual of {order_number} (attempt {attempt})");
            let reply = match self.source.fetch_accrual(order_number).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("🕰️ Accrual request for {order_number} failed: {e}");
                    return PollOutcome::Abandoned;
                },
            };
            let order = match reply {
                AccrualReply::Ready(order) => order,
                AccrualReply::RateLimited(delay) => {
                    info!("🕰️ Accrual service is rate limiting us. Pausing all requests for {}s", delay.as_secs_f32());
                    self.gate.close_for(delay);
                    continue;
                },
                AccrualReply::Unavailable => {
                    warn!("🕰️ Accrual service failed while looking up {order_number}");
                    return PollOutcome::Abandoned;
                },
                AccrualReply::Unexpected(code) => {
                    debug!("🕰️ Accrual service replied {code} for {order_number}");
                    return PollOutcome::Abandoned;
                },
            };
            if order.order != order_number.as_str() {
                warn!("🕰️ Asked about {order_number}, but the accrual service answered for #{}", order.order);
                return PollOutcome::Abandoned;
            }
            let Some(status) = internal_status(order.status) else {
                debug!("🕰️ Unknown accrual status for {order_number}: {:?}", order.status);
                return PollOutcome::Abandoned;
            };
            let Some(amount) = verdict_amount(status, order.accrual) else {
                warn!("🕰️ Accrual service reported a negative accrual for {order_number}: {:?}", order.accrual);
                return PollOutcome::Abandoned;
            };
            if let Err(e) = self.api.reconcile(order_number, status, amount).await {
                error!("🕰️ Could not reconcile {order_number} as {status}: {e}");
                return PollOutcome::Abandoned;
            }
            if status.is_terminal() {
                return PollOutcome::Settled(status);
            }
            sleep(self.config.poll_interval).await;
        }
        PollOutcome::Exhausted
    }

    async fn run_consumer(self: Arc<Self>, id: usize, mut shutdown: watch::Receiver<bool>) {
        debug!("🕰️ Reconciliation worker {id} started");
        loop {
            let next = tokio::select! {
                _ = shutdown.changed() => break,
                next = self.queue.next() => next,
            };
            let Some(order_number) = next else { break };
            tokio::select! {
                _ = shutdown.changed() => {
                    self.queue.release(&order_number);
                    break;
                },
                outcome = self.poll_order(&order_number) => {
                    debug!("🕰️ Worker {id}: order {order_number} {outcome}");
                },
            }
            self.queue.release(&order_number);
        }
        debug!("🕰️ Reconciliation worker {id} stopped");
    }

    async fn run_sweeper(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut timer = tokio::time::interval(self.config.sweep_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = timer.tick() => {
                    let queued = self.sweep().await;
                    if queued > 0 {
                        info!("🕰️ Sweep queued {queued} pending orders");
                    }
                },
            }
        }
        debug!("🕰️ Sweeper stopped");
    }
}

/// Controls a running reconciliation pool.
pub struct ReconciliationHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    queue: OrderQueue,
    gate: BackpressureGate,
}

impl ReconciliationHandle {
    pub fn queue(&self) -> &OrderQueue {
        &self.queue
    }

    pub fn gate(&self) -> &BackpressureGate {
        &self.gate
    }

    /// Stops the sweeper and every worker. Polls that are in progress are abandoned; the orders stay pending and are
    /// picked up by the next run.
    pub async fn shutdown(self) {
        info!("🕰️ Stopping accrual reconciliation");
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("🕰️ A reconciliation task did not stop cleanly: {e}");
            }
        }
        info!("🕰️ Accrual reconciliation stopped");
    }
}

/// The amount that [`ReconciliationWorker::poll_order`] will record for a verdict, or `None` if a processed order
/// claims a negative accrual.
pub fn verdict_amount(status: OrderStatusType, accrual: Option<Points>) -> Option<Points> {
    match status {
        OrderStatusType::Processed => Some(accrual.unwrap_or_default()).filter(|a| *a >= Points::default()),
        _ => Some(Points::default()),
    }
}
