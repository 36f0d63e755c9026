use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Connection, Either, Executor, Row, ValueRef};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::PostgresConfig;
use crate::db::models::ResultTable;
use crate::error::AskDbError;

/// Executes SQL text and hands back a table.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    async fn run_query(&self, sql: &str) -> Result<ResultTable, AskDbError>;
}

/// Gateway backed by a single PostgreSQL connection shared by every session.
///
/// The connection is opened on first use and reused afterwards. A failed
/// connect leaves nothing behind, so the next query tries again from scratch.
pub struct PgGateway {
    settings: PostgresConfig,
    conn: Mutex<Option<PgConnection>>,
}

impl PgGateway {
    pub fn new(settings: PostgresConfig) -> Self {
        Self {
            settings,
            conn: Mutex::new(None),
        }
    }

    #[cfg(test)]
    async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    async fn connect(&self) -> Result<PgConnection, AskDbError> {
        let url = self.settings.database_url()?;
        match PgConnection::connect(&url).await {
            Ok(conn) => {
                info!(database = %self.settings.redacted_url(), "database connection established");
                Ok(conn)
            }
            Err(e) => {
                warn!(
                    database = %self.settings.redacted_url(),
                    error = %e,
                    "database connection failed"
                );
                Err(AskDbError::DbConnection(e))
            }
        }
    }
}

#[async_trait]
impl QueryGateway for PgGateway {
    async fn run_query(&self, sql: &str) -> Result<ResultTable, AskDbError> {
        let mut slot = self.conn.lock().await;
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => self.connect().await?,
        };

        let result = fetch_last_result_set(&mut conn, sql).await;

        match result {
            Ok(rows) => {
                *slot = Some(conn);
                let table = rows_to_table(&rows).map_err(AskDbError::DbQuery)?;
                debug!(rows = table.row_count(), "query executed");
                Ok(table)
            }
            Err(e) => {
                if is_connection_broken(&e) {
                    warn!(error = %e, "dropping broken database connection");
                } else {
                    *slot = Some(conn);
                }
                Err(AskDbError::DbQuery(e))
            }
        }
    }
}

/// Simple-query protocol: arbitrary statements, every value in text format.
async fn fetch_last_result_set(
    conn: &mut PgConnection,
    sql: &str,
) -> Result<Vec<PgRow>, sqlx::Error> {
    let steps: Vec<_> = Executor::fetch_many(conn, sqlx::raw_sql(sql))
        .try_collect()
        .await?;
    Ok(last_result_set(steps))
}

/// Rows of the final statement. Each statement's rows are followed by its
/// completion marker, and earlier statements may return a different shape.
fn last_result_set<D, R>(steps: impl IntoIterator<Item = Either<D, R>>) -> Vec<R> {
    let mut last = Vec::new();
    let mut current = Vec::new();
    for step in steps {
        match step {
            Either::Left(_done) => last = std::mem::take(&mut current),
            Either::Right(row) => current.push(row),
        }
    }
    if current.is_empty() { last } else { current }
}

fn is_connection_broken(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed
    )
}

fn rows_to_table(rows: &[PgRow]) -> Result<ResultTable, sqlx::Error> {
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|idx| -> Result<Option<String>, sqlx::Error> {
                    if row.try_get_raw(idx)?.is_null() {
                        return Ok(None);
                    }
                    row.try_get_unchecked::<String, _>(idx).map(Some)
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(ResultTable::new(columns, rows))
}
