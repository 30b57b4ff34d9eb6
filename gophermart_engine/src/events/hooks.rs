use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderReconciledEvent, OrderSubmittedEvent};

/// Cheap to clone. Every API instance that emits events holds one of these.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_submitted_producer: Vec<EventProducer<OrderSubmittedEvent>>,
    pub order_reconciled_producer: Vec<EventProducer<OrderReconciledEvent>>,
}

pub struct EventHandlers {
    pub on_order_submitted: Option<EventHandler<OrderSubmittedEvent>>,
    pub on_order_reconciled: Option<EventHandler<OrderReconciledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_submitted = hooks.on_order_submitted.map(|f| EventHandler::new(buffer_size, f));
        let on_order_reconciled = hooks.on_order_reconciled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_submitted, on_order_reconciled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_submitted {
            result.order_submitted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_reconciled {
            result.order_reconciled_producer.push(handler.subscribe());
        }
        result
    }

    pub fn start_handlers(self) {
        if let Some(handler) = self.on_order_submitted {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_reconciled {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_submitted: Option<Handler<OrderSubmittedEvent>>,
    pub on_order_reconciled: Option<Handler<OrderReconciledEvent>>,
}

impl EventHooks {
    pub fn on_order_submitted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSubmittedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_submitted = Some(Arc::new(f));
        self
    }

    pub fn on_order_reconciled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderReconciledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_reconciled = Some(Arc::new(f));
        self
    }
}
