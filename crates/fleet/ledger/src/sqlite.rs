//! SQLite ledger implementation

use crate::error::{LedgerError, LedgerResult};
use crate::traits::DeviceLedger;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use fleet_types::{DeviceRecord, DeviceState, MarkOutcome, Serial};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::BTreeSet;
use std::str::FromStr;

/// SQLite-backed ledger
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Open (or create) the database at `url` and initialize the schema
    pub async fn connect(url: &str, max_connections: u32) -> LedgerResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| LedgerError::Connection(e.to_string()))?
            .create_if_missing(true);

        // Every connection to `:memory:` is a separate database
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| LedgerError::Connection(e.to_string()))?;

        let ledger = Self { pool };
        ledger.initialize_schema().await?;
        tracing::debug!(url = %url, "Ledger opened");
        Ok(ledger)
    }

    /// Private in-memory database, mostly for tests
    pub async fn in_memory() -> LedgerResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn initialize_schema(&self) -> LedgerResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS device_status (
                sn TEXT PRIMARY KEY NOT NULL,
                modify_flag INTEGER NOT NULL DEFAULT 0 CHECK (modify_flag IN (0, 1)),
                modify_time TEXT,
                created_at TEXT NOT NULL,
                CHECK (
                    (modify_flag = 0 AND modify_time IS NULL)
                    OR (modify_flag = 1 AND modify_time IS NOT NULL)
                )
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS device_status_modify_flag ON device_status(modify_flag);"#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(query_error)?;
        }

        Ok(())
    }

    // Fixed-width text so that lexical order matches time order
    fn encode_time(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Accepts our RFC 3339 text and SQLite's `CURRENT_TIMESTAMP` form
    /// (`YYYY-MM-DD HH:MM:SS`, always UTC) found in databases created by
    /// earlier deployments.
    fn decode_time(raw: &str) -> LedgerResult<DateTime<Utc>> {
        if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
            return Ok(t.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
            .map(|t| t.and_utc())
            .map_err(|e| LedgerError::InvalidData(format!("bad timestamp '{}': {}", raw, e)))
    }

    fn map_row(row: &SqliteRow) -> LedgerResult<DeviceRecord> {
        let sn: String = row.try_get("sn").map_err(query_error)?;
        let flag: i64 = row.try_get("modify_flag").map_err(query_error)?;
        let modify_time: Option<String> = row.try_get("modify_time").map_err(query_error)?;
        let created_at: String = row.try_get("created_at").map_err(query_error)?;

        let serial = Serial::parse(&sn)
            .map_err(|e| LedgerError::InvalidData(format!("bad serial '{}': {}", sn, e)))?;
        let state = match flag {
            0 => DeviceState::Unmodified,
            1 => DeviceState::Modified,
            other => {
                return Err(LedgerError::InvalidData(format!(
                    "bad modify_flag {} for {}",
                    other, serial
                )))
            }
        };

        Ok(DeviceRecord {
            serial,
            state,
            modified_at: modify_time.as_deref().map(Self::decode_time).transpose()?,
            created_at: Self::decode_time(&created_at)?,
        })
    }
}

fn query_error(e: sqlx::Error) -> LedgerError {
    LedgerError::Query(e.to_string())
}

#[async_trait]
impl DeviceLedger for SqliteLedger {
    async fn seed(&self, serials: &[Serial]) -> LedgerResult<usize> {
        let unique: BTreeSet<&Serial> = serials.iter().collect();
        let created_at = Self::encode_time(Utc::now());

        let mut tx = self.pool.begin().await.map_err(query_error)?;
        let mut inserted = 0usize;

        for serial in unique {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO device_status (sn, modify_flag, modify_time, created_at) \
                 VALUES (?1, 0, NULL, ?2)",
            )
            .bind(serial.as_str())
            .bind(&created_at)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(inserted)
    }

    async fn list_unmodified(&self) -> LedgerResult<BTreeSet<Serial>> {
        let rows = sqlx::query("SELECT sn FROM device_status WHERE modify_flag = 0")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let sn: String = row.try_get("sn").map_err(query_error)?;
                Serial::parse(&sn)
                    .map_err(|e| LedgerError::InvalidData(format!("bad serial '{}': {}", sn, e)))
            })
            .collect()
    }

    async fn list_all(&self) -> LedgerResult<Vec<DeviceRecord>> {
        let rows = sqlx::query(
            "SELECT sn, modify_flag, modify_time, created_at FROM device_status \
             ORDER BY created_at DESC, sn ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn mark_modified(&self, serial: &Serial) -> LedgerResult<MarkOutcome> {
        let now = Utc::now();
        let stamp = Self::encode_time(now);

        let result = sqlx::query(
            "UPDATE device_status SET modify_flag = 1, modify_time = ?1 \
             WHERE sn = ?2 AND modify_flag = 0",
        )
        .bind(&stamp)
        .bind(serial.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 1 {
            return Ok(MarkOutcome::Modified {
                at: Self::decode_time(&stamp)?,
            });
        }

        let row = sqlx::query("SELECT modify_time FROM device_status WHERE sn = ?1")
            .bind(serial.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        match row {
            None => Err(LedgerError::NotFound(serial.clone())),
            Some(row) => {
                let first: Option<String> = row.try_get("modify_time").map_err(query_error)?;
                let first = first.ok_or_else(|| {
                    LedgerError::InvalidData(format!("{} is modified without a timestamp", serial))
                })?;
                Ok(MarkOutcome::AlreadyModified {
                    at: Self::decode_time(&first)?,
                })
            }
        }
    }

    async fn count(&self) -> LedgerResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM device_status")
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;

        usize::try_from(count)
            .map_err(|_| LedgerError::InvalidData(format!("record count {} out of range", count)))
    }
}
