//! SQLite backend for the trade store.
//!
//! Rows carry an internal sequence column so ledger order survives the
//! round trip; it never leaves this module. Money columns are stored as TEXT
//! to keep decimal values exact.

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::debug;

use crate::models::TradeRecord;

use super::{TradeRow, TradeStore};

/// Trade store backed by a SQLite database.
pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct StoredRow {
    data: String,
    symbol: String,
    direcao: String,
    entrada: String,
    stop_loss: String,
    target: String,
    risco: String,
    size: String,
    leverage: String,
    saida: String,
    pnl: String,
    status: String,
}

impl StoredRow {
    fn into_record(self) -> Result<TradeRecord> {
        let parse = |field: &str, value: &str| -> Result<Decimal> {
            value
                .parse::<Decimal>()
                .with_context(|| format!("invalid decimal in column {field}: {value:?}"))
        };

        TradeRow {
            timestamp: self.data,
            symbol: self.symbol,
            direction: self.direcao,
            entry_price: parse("entrada", &self.entrada)?,
            stop_price: parse("stop_loss", &self.stop_loss)?,
            target_price: parse("target", &self.target)?,
            risk_amount: parse("risco", &self.risco)?,
            position_size: parse("size", &self.size)?,
            leverage: parse("leverage", &self.leverage)?,
            exit_price: parse("saida", &self.saida)?,
            pnl: parse("pnl", &self.pnl)?,
            status: self.status,
        }
        .into_record()
    }
}

impl SqliteStore {
    /// Open (or create) the database and ensure the schema exists. A missing
    /// database file is an empty ledger, so it is created on first open.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database URL {database_url:?}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to connect to database")?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                data TEXT NOT NULL,
                symbol TEXT NOT NULL,
                direcao TEXT NOT NULL,
                entrada TEXT NOT NULL,
                stop_loss TEXT NOT NULL,
                target TEXT NOT NULL,
                risco TEXT NOT NULL,
                size TEXT NOT NULL,
                leverage TEXT NOT NULL,
                saida TEXT NOT NULL,
                pnl TEXT NOT NULL,
                status TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TradeStore for SqliteStore {
    async fn load(&self) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query_as::<_, StoredRow>(
            "SELECT data, symbol, direcao, entrada, stop_loss, target, risco, size, leverage, saida, pnl, status
             FROM trades ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch trades")?;

        rows.into_iter().map(StoredRow::into_record).collect()
    }

    async fn replace_all(&self, records: &[TradeRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        sqlx::query("DELETE FROM trades").execute(&mut *tx).await?;

        for record in records {
            let row = TradeRow::from_record(record);
            sqlx::query(
                r#"
                INSERT INTO trades (data, symbol, direcao, entrada, stop_loss, target, risco, size, leverage, saida, pnl, status)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.timestamp)
            .bind(&row.symbol)
            .bind(&row.direction)
            .bind(row.entry_price.to_string())
            .bind(row.stop_price.to_string())
            .bind(row.target_price.to_string())
            .bind(row.risk_amount.to_string())
            .bind(row.position_size.to_string())
            .bind(row.leverage.to_string())
            .bind(row.exit_price.to_string())
            .bind(row.pnl.to_string())
            .bind(&row.status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.context("failed to commit replace-all")?;
        debug!(rows = records.len(), "SQLite store rewritten");
        Ok(())
    }
}
