use std::future::Future;

use accrual_tools::{AccrualApi, AccrualApiError, AccrualReply};

use crate::db_types::OrderNumber;

/// Anything that can answer "what is the accrual status of this order?".
pub trait AccrualSource: Send + Sync + 'static {
    fn fetch_accrual(
        &self,
        order_number: &OrderNumber,
    ) -> impl Future<Output = Result<AccrualReply, AccrualApiError>> + Send;
}

impl AccrualSource for AccrualApi {
    async fn fetch_accrual(&self, order_number: &OrderNumber) -> Result<AccrualReply, AccrualApiError> {
        self.fetch_order(order_number.as_str()).await
    }
}
