//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a few lines belong in the engine. Keep this
//! module neat and tidy 🙏
//!
//! Every handler is async, and every storage call is awaited, so a slow database never blocks a worker thread.
use actix_web::{get, http::header::AUTHORIZATION, web, HttpMessage, HttpRequest, HttpResponse, Responder};
use gophermart_engine::{
    order_objects::SubmitOutcome,
    traits::{AuthManagement, LedgerManagement},
    AccountApi,
    AuthApi,
    OrderFlowApi,
    OrderFlowError,
};
use log::*;

use crate::{
    auth::{AuthenticatedUser, TokenIssuer},
    data_objects::{Credentials, JsonResponse, OrderResult, WithdrawalRequest, WithdrawalResult},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(register => Post "/user/register" impl AuthManagement);
/// Creates a new user and logs them straight in.
///
/// The body is JSON: `{"login": "...", "password": "..."}`. Responds with 409 if the login is taken.
pub async fn register<B: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let Credentials { login, password } = body.into_inner();
    let user = api.register(&login, &password).await?;
    debug!("💻️ Issuing first session token for {login}");
    session_response(&signer, user.id, "Registration successful")
}

route!(login => Post "/user/login" impl AuthManagement);
pub async fn login<B: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received login request");
    let Credentials { login, password } = body.into_inner();
    let user = api.authenticate(&login, &password).await?;
    debug!("💻️ User #{} logged in", user.id);
    session_response(&signer, user.id, "Login successful")
}

fn session_response(signer: &TokenIssuer, user_id: i64, message: &str) -> Result<HttpResponse, ServerError> {
    let token = signer.issue_token(user_id)?;
    Ok(HttpResponse::Ok()
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .cookie(signer.cookie(&token))
        .json(JsonResponse::success(message)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/user/orders" impl LedgerManagement);
/// Submits an order number for accrual. The body is the bare number, as `text/plain`.
///
/// * 202: the order is new and has been queued for accrual.
/// * 200: this user already submitted the order.
/// * 409: somebody else submitted it, or it was used for a withdrawal.
/// * 422: the number fails the Luhn check.
pub async fn submit_order<B: LedgerManagement>(
    req: HttpRequest,
    user: AuthenticatedUser,
    body: String,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    require_content_type(&req, "text/plain")?;
    trace!("💻️ User #{} submitted order {body}", user.user_id);
    match api.submit_order(user.user_id, &body).await? {
        SubmitOutcome::Accepted(entry) => {
            Ok(HttpResponse::Accepted().json(JsonResponse::success(format!("Order {} accepted", entry.order_number))))
        },
        SubmitOutcome::AlreadySubmitted(entry) => Ok(HttpResponse::Ok()
            .json(JsonResponse::success(format!("Order {} has already been submitted", entry.order_number)))),
    }
}

route!(my_orders => Get "/user/orders" impl LedgerManagement);
/// The user's orders, oldest first. 204 if there are none.
pub async fn my_orders<B: LedgerManagement>(
    user: AuthenticatedUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET orders for user #{}", user.user_id);
    let orders = api.get_orders(user.user_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResult::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/user/balance" impl LedgerManagement);
pub async fn my_balance<B: LedgerManagement>(
    user: AuthenticatedUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET balance for user #{}", user.user_id);
    let balance = api.get_balance(user.user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(withdraw => Post "/user/balance/withdraw" impl LedgerManagement);
/// Spends points against a new order number. The body is JSON: `{"order": "...", "sum": 751}`.
///
/// * 402: the balance does not cover `sum`.
/// * 422: bad order number, non-positive sum, or the number has been used before.
pub async fn withdraw<B: LedgerManagement>(
    user: AuthenticatedUser,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawalRequest { order, sum } = body.into_inner();
    trace!("💻️ User #{} wants to withdraw {sum} against order {order}", user.user_id);
    let entry = api.withdraw(user.user_id, &order, sum).await.map_err(|e| match e {
        // A used number is a bad withdrawal request, not a conflict over ownership
        OrderFlowError::OrderNumberInUse(_) | OrderFlowError::OrderClaimedByOtherUser(_) => {
            ServerError::UnprocessableEntity(e.to_string())
        },
        e => e.into(),
    })?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Withdrew {sum} against order {}", entry.order_number))))
}

route!(my_withdrawals => Get "/user/withdrawals" impl LedgerManagement);
/// The user's withdrawals, oldest first. 204 if there are none.
pub async fn my_withdrawals<B: LedgerManagement>(
    user: AuthenticatedUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET withdrawals for user #{}", user.user_id);
    let withdrawals = api.get_withdrawals(user.user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalResult::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}

fn require_content_type(req: &HttpRequest, expected: &'static str) -> Result<(), ServerError> {
    if req.content_type().eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        debug!("💻️ Rejected request with content type '{}'. Expected {expected}", req.content_type());
        Err(ServerError::UnsupportedContentType(expected))
    }
}
