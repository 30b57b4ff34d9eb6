use std::collections::HashMap;

use cucumber::World;
use gophermart_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct GophermartWorld {
    pub system: Option<LedgerSystem>,
    pub users: HashMap<String, i64>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct LedgerSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase>,
}

impl GophermartWorld {
    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase> {
        &self.system.as_ref().expect("OrderFlowApi not initialised").api
    }

    pub fn user_id(&self, name: &str) -> i64 {
        *self.users.get(name).unwrap_or_else(|| panic!("User {name} has not been registered"))
    }
}

impl LedgerSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let api = OrderFlowApi::new(db, EventProducers::default());
        Self { db_path: url, api }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
