use std::path::Path;
use std::str::FromStr;

use chequera_core::{Confidence, ConfidenceRow, Money, Row};
use chrono::NaiveDate;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

pub type DbPool = Pool<Sqlite>;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS checks (
            id TEXT PRIMARY KEY,
            bank TEXT NOT NULL,
            date TEXT,
            city TEXT NOT NULL,
            account_number TEXT NOT NULL,
            account_name TEXT NOT NULL,
            client_name TEXT NOT NULL,
            check_number TEXT NOT NULL,
            amount TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Confidence rows are kept apart from the checks they score and are not
    // removed with them; see `prune_orphan_confidences`.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS check_confidences (
            check_id TEXT PRIMARY KEY,
            date REAL NOT NULL,
            city REAL NOT NULL,
            account_number REAL NOT NULL,
            account_name REAL NOT NULL,
            client_name REAL NOT NULL,
            check_number REAL NOT NULL,
            amount REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// A stored check with its confidence row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub row: Row,
    pub confidence: ConfidenceRow,
}

/// Store a row and its confidences together; neither is written if either fails.
pub async fn insert_check(
    pool: &DbPool,
    row: &Row,
    confidence: &ConfidenceRow,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO checks (id, bank, date, city, account_number, account_name, client_name, check_number, amount) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&row.id)
    .bind(&row.bank)
    .bind(row.date.map(|d| d.format(DATE_FORMAT).to_string()))
    .bind(&row.city)
    .bind(&row.account_number)
    .bind(&row.account_name)
    .bind(&row.client_name)
    .bind(&row.check_number)
    .bind(row.amount.as_decimal().to_string())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO check_confidences (check_id, date, city, account_number, account_name, client_name, check_number, amount) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&row.id)
    .bind(confidence.date.value() as f64)
    .bind(confidence.city.value() as f64)
    .bind(confidence.account_number.value() as f64)
    .bind(confidence.account_name.value() as f64)
    .bind(confidence.client_name.value() as f64)
    .bind(confidence.check_number.value() as f64)
    .bind(confidence.amount.value() as f64)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

pub async fn is_processed(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM checks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

type EntryRecord = (
    String,
    String,
    Option<String>,
    String,
    String,
    String,
    String,
    String,
    String,
    f64,
    f64,
    f64,
    f64,
    f64,
    f64,
    f64,
);

/// Every check that has a confidence row, in insertion order.
pub async fn get_all_checks(pool: &DbPool) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let records = sqlx::query_as::<_, EntryRecord>(
        r#"
        SELECT c.id, c.bank, c.date, c.city, c.account_number, c.account_name,
               c.client_name, c.check_number, c.amount,
               s.date, s.city, s.account_number, s.account_name,
               s.client_name, s.check_number, s.amount
        FROM checks c
        JOIN check_confidences s ON s.check_id = c.id
        ORDER BY c.rowid
        "#,
    )
    .fetch_all(pool)
    .await?;

    records.into_iter().map(entry_from_record).collect()
}

fn entry_from_record(r: EntryRecord) -> Result<LedgerEntry, sqlx::Error> {
    let date = r
        .2
        .map(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT))
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let amount = Money::from_str(&r.8).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let stored = |v: f64| Confidence::from_stored(v as f32);

    Ok(LedgerEntry {
        row: Row {
            id: r.0,
            bank: r.1,
            date,
            city: r.3,
            account_number: r.4,
            account_name: r.5,
            client_name: r.6,
            check_number: r.7,
            amount,
        },
        confidence: ConfidenceRow {
            date: stored(r.9),
            city: stored(r.10),
            account_number: stored(r.11),
            account_name: stored(r.12),
            client_name: stored(r.13),
            check_number: stored(r.14),
            amount: stored(r.15),
        },
    })
}

/// Remove a check row. Its confidence row stays until pruned.
pub async fn delete_check(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM checks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete confidence rows whose check is gone. Returns how many were removed.
pub async fn prune_orphan_confidences(pool: &DbPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM check_confidences WHERE check_id NOT IN (SELECT id FROM checks)",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
