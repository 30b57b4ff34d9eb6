use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{LedgerEntry, OrderNumber, OrderStatusType, Points},
    events::{EventProducers, OrderReconciledEvent, OrderSubmittedEvent},
    helpers::is_valid_luhn,
    order_objects::SubmitOutcome,
    traits::{LedgerError, LedgerManagement, StatusUpdate},
    OrderFlowError,
};

/// `OrderFlowApi` handles everything that changes the ledger: users submitting orders, users withdrawing points, and
/// the reconciliation worker writing accrual verdicts back.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: LedgerManagement
{
    /// Submit an order number on behalf of a user.
    ///
    /// Leading and trailing whitespace is ignored. The number must pass the Luhn check, otherwise
    /// [`OrderFlowError::BadOrderNumber`] is returned and nothing is stored.
    ///
    /// Submitting the same number twice as the same user is not an error: the second call returns
    /// [`SubmitOutcome::AlreadySubmitted`]. If another user owns the number, the result is
    /// [`OrderFlowError::OrderClaimedByOtherUser`].
    ///
    /// Newly accepted orders are announced to the `order_submitted` subscribers, which is how they reach the
    /// reconciliation queue straight away.
    pub async fn submit_order(&self, user_id: i64, order_number: &str) -> Result<SubmitOutcome, OrderFlowError> {
        let number = validated_order_number(order_number)?;
        match self.db.insert_debit(user_id, &number).await {
            Ok(entry) => {
                debug!("🔄️📦️ Order {number} accepted for user #{user_id}");
                self.call_order_submitted_hook(&entry).await;
                Ok(SubmitOutcome::Accepted(entry))
            },
            Err(LedgerError::AlreadyInsertedBySelf(_)) => {
                debug!("🔄️📦️ User #{user_id} resubmitted order {number}");
                let entry = self
                    .db
                    .fetch_entry_by_order_number(&number)
                    .await?
                    .ok_or_else(|| OrderFlowError::OrderNotFound(number.clone()))?;
                Ok(SubmitOutcome::AlreadySubmitted(entry))
            },
            Err(LedgerError::AlreadyInsertedByOther(_)) => {
                info!("🔄️📦️ User #{user_id} tried to submit order {number}, which belongs to someone else");
                Err(OrderFlowError::OrderClaimedByOtherUser(number))
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Withdraw `amount` points from the user's balance against the given order number.
    ///
    /// The number must pass the Luhn check and must not have been used before. The amount must be positive, and the
    /// user's current balance must cover it.
    pub async fn withdraw(&self, user_id: i64, order_number: &str, amount: Points) -> Result<LedgerEntry, OrderFlowError> {
        let number = validated_order_number(order_number)?;
        if !amount.is_positive() {
            return Err(OrderFlowError::InvalidAmount(amount));
        }
        let entry = self.db.insert_credit(user_id, &number, amount).await.map_err(|e| {
            if let LedgerError::InsufficientBalance { available, .. } = &e {
                info!("🔄️💸️ User #{user_id} tried to withdraw {amount} with only {available} available");
            }
            OrderFlowError::from(e)
        })?;
        info!("🔄️💸️ User #{user_id} withdrew {amount} against order {number}");
        Ok(entry)
    }

    /// Apply an accrual verdict to an order.
    ///
    /// Only `Processed` orders keep a non-zero amount, and that amount may not be negative. For every other status the
    /// amount is forced to zero, so that nothing counts towards a balance until the accrual is final. Once an order
    /// has a terminal status, any different verdict is ignored.
    pub async fn reconcile(
        &self,
        order_number: &OrderNumber,
        status: OrderStatusType,
        amount: Points,
    ) -> Result<StatusUpdate, OrderFlowError> {
        let amount = match status {
            OrderStatusType::Processed if amount < Points::default() => {
                warn!("🔄️🧾️ Refusing a negative accrual of {amount} for order {order_number}");
                return Err(OrderFlowError::InvalidAmount(amount));
            },
            OrderStatusType::Processed => amount,
            _ => Points::default(),
        };
        let update = self.db.update_debit_status(order_number, status, amount).await?;
        match &update {
            StatusUpdate::Applied { previous, entry } => {
                debug!("🔄️🧾️ Order {order_number} moved from {previous} to {status} ({amount})");
                self.call_order_reconciled_hook(*previous, entry).await;
            },
            StatusUpdate::Unchanged(_) => trace!("🔄️🧾️ Order {order_number} is already {status}"),
            StatusUpdate::Ignored(entry) => {
                warn!(
                    "🔄️🧾️ Update for order {order_number} ignored. It is already {} ({}) and will not move to \
                     {status} ({amount})",
                    entry.status, entry.amount
                );
            },
        }
        Ok(update)
    }

    pub async fn list_pending(&self) -> Result<Vec<LedgerEntry>, OrderFlowError> {
        Ok(self.db.list_pending().await?)
    }

    pub async fn list_pending_by_user(&self, user_id: i64) -> Result<Vec<LedgerEntry>, OrderFlowError> {
        Ok(self.db.list_pending_by_user(user_id).await?)
    }

    async fn call_order_submitted_hook(&self, entry: &LedgerEntry) {
        for emitter in &self.producers.order_submitted_producer {
            trace!("🔄️📦️ Notifying order submitted hook subscribers");
            emitter.publish_event(OrderSubmittedEvent { entry: entry.clone() }).await;
        }
    }

    async fn call_order_reconciled_hook(&self, previous_status: OrderStatusType, entry: &LedgerEntry) {
        for emitter in &self.producers.order_reconciled_producer {
            trace!("🔄️🧾️ Notifying order reconciled hook subscribers");
            emitter.publish_event(OrderReconciledEvent { previous_status, entry: entry.clone() }).await;
        }
    }
}

fn validated_order_number(order_number: &str) -> Result<OrderNumber, OrderFlowError> {
    let trimmed = order_number.trim();
    if is_valid_luhn(trimmed) {
        Ok(OrderNumber::from(trimmed))
    } else {
        Err(OrderFlowError::BadOrderNumber(order_number.to_string()))
    }
}
