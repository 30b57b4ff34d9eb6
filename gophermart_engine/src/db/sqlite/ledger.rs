use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Balance, EntryKind, LedgerEntry, OrderNumber, OrderStatusType, Points},
    order_objects::EntryQueryFilter,
};

/// Inserts a new `New` debit entry, unless the order number is already taken.
///
/// Returns `None` if the number is taken. The check is done by the unique index on `order_number`, in the same
/// statement as the insert, so two concurrent submissions cannot both succeed.
pub async fn insert_debit(
    user_id: i64,
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO ledger (user_id, order_number, kind, status, amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, $5, $5)
            ON CONFLICT (order_number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(order_number)
    .bind(EntryKind::Debit)
    .bind(OrderStatusType::New)
    .bind(now)
    .fetch_optional(conn)
    .await
}

/// Inserts a credit entry for `amount` (stored as a negative value). This does not check the balance. Run it in a
/// transaction after [`balance`] if you need that.
pub async fn insert_credit(
    user_id: i64,
    order_number: &OrderNumber,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<LedgerEntry, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO ledger (user_id, order_number, kind, status, amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(order_number)
    .bind(EntryKind::Credit)
    .bind(OrderStatusType::Withdrawn)
    .bind(-amount)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Sets the status and amount of a debit entry.
///
/// The `WHERE` clause repeats the terminal guard, so nothing can overwrite a terminal entry, even if it slips past the
/// caller's own check. Returns `None` if no row was updated.
pub async fn update_debit_status(
    order_number: &OrderNumber,
    status: OrderStatusType,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE ledger SET status = $1, amount = $2, updated_at = $3
            WHERE order_number = $4 AND kind = 'DEBIT' AND status IN ('NEW', 'PROCESSING')
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(amount)
    .bind(Utc::now())
    .bind(order_number)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_entry_by_order_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ledger WHERE order_number = $1").bind(order_number).fetch_optional(conn).await
}

/// Fetches entries according to the criteria in the `EntryQueryFilter`, ordered by `created_at`, then `id`.
pub async fn search_entries(
    query: EntryQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM ledger ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(kind) = query.kind {
        where_clause.push("kind = ");
        where_clause.push_bind_unseparated(kind);
    }
    if !query.statuses.is_empty() {
        where_clause.push("status IN (");
        let mut first = true;
        for status in query.statuses {
            if !first {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
            first = false;
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let entries = builder.build_query_as::<LedgerEntry>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_entries: {}", entries.len());
    Ok(entries)
}

pub async fn balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Balance, sqlx::Error> {
    let (current, withdrawn): (i64, i64) = sqlx::query_as(
        r#"
            SELECT
                COALESCE(SUM(amount), 0),
                COALESCE(-SUM(CASE WHEN kind = 'CREDIT' THEN amount ELSE 0 END), 0)
            FROM ledger WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(Balance { current: Points::from(current), withdrawn: Points::from(withdrawn) })
}
