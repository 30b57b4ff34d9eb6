//! `SqliteDatabase` is the production backend of the gophermart engine.
//!
//! SQLite allows a single writer at a time. Rather than letting concurrent writers race for the file lock (and fail
//! with `SQLITE_BUSY` when they lose), every write goes through a process-wide async lock. Reads are not affected.
use std::{fmt::Debug, sync::Arc};

use log::*;
use sqlx::{migrate, SqlitePool};
use tokio::sync::Mutex;

use super::{db_url, ledger, new_pool, users};
use crate::{
    db_types::{Balance, EntryKind, LedgerEntry, NewUser, OrderNumber, OrderStatusType, Points, Transition, User},
    order_objects::EntryQueryFilter,
    traits::{AuthApiError, AuthManagement, LedgerError, LedgerManagement, StatusUpdate},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connects to the database given by the `DATABASE_URI` environment variable, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool, write_lock: Arc::new(Mutex::new(())) })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn insert_debit(&self, user_id: i64, order_number: &OrderNumber) -> Result<LedgerEntry, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut conn = self.pool.acquire().await?;
        if let Some(entry) = ledger::insert_debit(user_id, order_number, &mut conn).await? {
            debug!("🗃️ Order {order_number} has been saved for user #{user_id} with id {}", entry.id);
            return Ok(entry);
        }
        let existing = ledger::fetch_entry_by_order_number(order_number, &mut conn)
            .await?
            .ok_or_else(|| LedgerError::DatabaseError(format!("Order {order_number} collided but does not exist")))?;
        Err(LedgerError::conflict(&existing, user_id))
    }

    async fn insert_credit(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
        amount: Points,
    ) -> Result<LedgerEntry, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        if ledger::fetch_entry_by_order_number(order_number, &mut tx).await?.is_some() {
            return Err(LedgerError::OrderNumberInUse(order_number.clone()));
        }
        let available = ledger::balance(user_id, &mut tx).await?.current;
        if available < amount {
            return Err(LedgerError::InsufficientBalance { available, requested: amount });
        }
        let entry = match ledger::insert_credit(user_id, order_number, amount, &mut tx).await {
            Ok(entry) => entry,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(LedgerError::OrderNumberInUse(order_number.clone()));
            },
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        debug!("🗃️ Withdrawal of {amount} against {order_number} saved for user #{user_id}");
        Ok(entry)
    }

    async fn update_debit_status(
        &self,
        order_number: &OrderNumber,
        status: OrderStatusType,
        amount: Points,
    ) -> Result<StatusUpdate, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let current = ledger::fetch_entry_by_order_number(order_number, &mut tx)
            .await?
            .filter(|e| e.kind == EntryKind::Debit)
            .ok_or_else(|| LedgerError::OrderNotFound(order_number.clone()))?;
        let result = match current.transition_to(status, amount) {
            Transition::Refuse => StatusUpdate::Ignored(current),
            Transition::Unchanged => StatusUpdate::Unchanged(current),
            Transition::Apply => match ledger::update_debit_status(order_number, status, amount, &mut tx).await? {
                Some(entry) => StatusUpdate::Applied { previous: current.status, entry },
                None => StatusUpdate::Ignored(current),
            },
        };
        tx.commit().await?;
        trace!("🗃️ Status update for {order_number}: {result:?}");
        Ok(result)
    }

    async fn fetch_entry_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let entry = ledger::fetch_entry_by_order_number(order_number, &mut conn).await?;
        Ok(entry)
    }

    async fn search_entries(&self, query: EntryQueryFilter) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let entries = ledger::search_entries(query, &mut conn).await?;
        Ok(entries)
    }

    async fn balance(&self, user_id: i64) -> Result<Balance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = ledger::balance(user_id, &mut conn).await?;
        Ok(balance)
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AuthManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let _guard = self.write_lock.lock().await;
        let mut conn = self.pool.acquire().await?;
        let user = users::insert_user(user, &mut conn).await?;
        debug!("🗃️ User #{} created", user.id);
        Ok(user)
    }

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_username(username, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }
}
