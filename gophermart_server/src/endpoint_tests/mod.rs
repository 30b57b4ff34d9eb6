mod accrual_flow;
mod auth;
mod balance;
mod helpers;
mod orders;
