use std::{sync::Arc, time::Duration};

use accrual_tools::AccrualApi;
use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use gophermart_engine::{
    create_database_if_missing,
    events::{EventHandlers, EventHooks, EventProducers},
    reconciliation::{EnqueueResult, OrderQueue, ReconciliationWorker},
    traits::{AuthManagement, LedgerManagement},
    AccountApi,
    AuthApi,
    MemoryDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, StorageBackend},
    errors::ServerError,
    routes::{
        health,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        SubmitOrderRoute,
        WithdrawRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 64;
const ACCESS_LOG_FORMAT: &str = "%t (%D ms) %s %a %{Host}i %U";
const FORWARDED_ACCESS_LOG_FORMAT: &str = "%t (%D ms) %s %{r}a %{Host}i %U";

/// Everything the request handlers need. Each field is shared between every worker thread of the server.
pub struct AppState<B> {
    pub orders_api: Arc<OrderFlowApi<B>>,
    pub accounts_api: Arc<AccountApi<B>>,
    pub auth_api: Arc<AuthApi<B>>,
    pub signer: Arc<TokenIssuer>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            orders_api: Arc::clone(&self.orders_api),
            accounts_api: Arc::clone(&self.accounts_api),
            auth_api: Arc::clone(&self.auth_api),
            signer: Arc::clone(&self.signer),
        }
    }
}

impl<B: Clone + LedgerManagement + AuthManagement> AppState<B> {
    pub fn new(db: B, producers: EventProducers, signer: TokenIssuer) -> Self {
        Self {
            orders_api: Arc::new(OrderFlowApi::new(db.clone(), producers)),
            accounts_api: Arc::new(AccountApi::new(db.clone())),
            auth_api: Arc::new(AuthApi::new(db)),
            signer: Arc::new(signer),
        }
    }
}

/// Malformed JSON bodies are the client's fault, and are reported as such.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not deserialize request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

/// Registers the shared state and every route. Used by the server and by the endpoint tests.
pub fn configure_app<B>(state: AppState<B>) -> impl FnOnce(&mut ServiceConfig)
where B: LedgerManagement + AuthManagement {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::from(state.orders_api))
            .app_data(web::Data::from(state.accounts_api))
            .app_data(web::Data::from(state.auth_api))
            .app_data(web::Data::from(state.signer))
            .app_data(json_config())
            .service(health);
        let api_scope = web::scope("/api")
            .service(RegisterRoute::<B>::new())
            .service(LoginRoute::<B>::new())
            .service(SubmitOrderRoute::<B>::new())
            .service(MyOrdersRoute::<B>::new())
            .service(MyBalanceRoute::<B>::new())
            .service(WithdrawRoute::<B>::new())
            .service(MyWithdrawalsRoute::<B>::new());
        cfg.service(api_scope);
    }
}

/// New orders go straight onto the reconciliation queue. If the queue is full, the sweeper picks them up later.
pub fn create_event_hooks(queue: OrderQueue) -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_submitted(move |ev| {
        let queue = queue.clone();
        Box::pin(async move {
            let number = ev.entry.order_number;
            match queue.try_enqueue(number.clone()) {
                EnqueueResult::Queued => debug!("📥️ Order {number} queued for accrual"),
                EnqueueResult::AlreadyInFlight => trace!("📥️ Order {number} is already in flight"),
                EnqueueResult::Full => info!("📥️ Queue is full. Order {number} will be picked up by the next sweep"),
            }
        })
    });
    hooks.on_order_reconciled(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Order {} for user #{} moved from {} to {} ({})",
                ev.entry.order_number, ev.entry.user_id, ev.previous_status, ev.entry.status, ev.entry.amount
            );
        })
    });
    hooks
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    match config.storage.clone() {
        StorageBackend::Memory => {
            warn!("🚀️ Using the in-memory backend. Every account and order is lost when the server stops.");
            serve(config, MemoryDatabase::new()).await
        },
        StorageBackend::Sqlite(url) => {
            create_database_if_missing(&url).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
            let db = SqliteDatabase::new_with_url(&url, 25)
                .await
                .map_err(|e| ServerError::InitializeError(e.to_string()))?;
            db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
            info!("🚀️ Connected to {url}");
            serve(config, db).await
        },
    }
}

/// Starts the reconciliation pool and the HTTP server, and runs until the server stops. The pool is shut down after
/// the server, so no order is polled after the process has stopped taking requests.
pub async fn serve<B>(config: ServerConfig, db: B) -> Result<(), ServerError>
where B: LedgerManagement + AuthManagement {
    let accrual = AccrualApi::new(config.accrual.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Accrual service is at {}", config.accrual.base_url);
    let queue = OrderQueue::new(config.reconciliation.queue_capacity);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks(queue.clone()));
    let producers = handlers.producers();
    handlers.start_handlers();

    let state = AppState::new(db, producers, TokenIssuer::new(&config.auth));
    let worker =
        ReconciliationWorker::new(Arc::clone(&state.orders_api), accrual, queue, config.reconciliation.clone());
    let handle = worker.start();

    let srv = match create_server_instance(&config, state) {
        Ok(srv) => srv,
        Err(e) => {
            handle.shutdown().await;
            return Err(e);
        },
    };
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    handle.shutdown().await;
    result
}

pub fn create_server_instance<B>(config: &ServerConfig, state: AppState<B>) -> Result<Server, ServerError>
where B: LedgerManagement + AuthManagement {
    let format = if config.use_x_forwarded_for { FORWARDED_ACCESS_LOG_FORMAT } else { ACCESS_LOG_FORMAT };
    let srv = HttpServer::new(move || {
        App::new().wrap(Logger::new(format).log_target("gm::access_log")).configure(configure_app(state.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
