use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oasis_core::{OperatorDirectory, StoreError, StoreResult};
use oasis_shared::{OperatorRecord, RequesterId};
use sqlx::SqlitePool;

pub struct SqliteOperatorDirectory {
    pool: SqlitePool,
}

impl SqliteOperatorDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OperatorRow {
    identity: String,
    username: Option<String>,
    full_name: Option<String>,
    promoted_at: DateTime<Utc>,
}

impl From<OperatorRow> for OperatorRecord {
    fn from(row: OperatorRow) -> Self {
        OperatorRecord {
            identity: RequesterId::new(row.identity),
            username: row.username,
            full_name: row.full_name,
            promoted_at: row.promoted_at,
        }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl OperatorDirectory for SqliteOperatorDirectory {
    async fn insert(&self, record: &OperatorRecord) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO operators (identity, username, full_name, promoted_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(record.identity.as_str())
        .bind(&record.username)
        .bind(&record.full_name)
        .bind(record.promoted_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate(record.identity.to_string()))
            }
            Err(err) => Err(backend(err)),
        }
    }

    async fn remove(&self, identity: &RequesterId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM operators WHERE identity = ?1")
            .bind(identity.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, identity: &RequesterId) -> StoreResult<Option<OperatorRecord>> {
        let row: Option<OperatorRow> = sqlx::query_as(
            "SELECT identity, username, full_name, promoted_at FROM operators WHERE identity = ?1",
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(OperatorRecord::from))
    }

    async fn list(&self) -> StoreResult<Vec<OperatorRecord>> {
        let rows: Vec<OperatorRow> = sqlx::query_as(
            "SELECT identity, username, full_name, promoted_at FROM operators ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(OperatorRecord::from).collect())
    }
}
