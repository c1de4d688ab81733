//! Background log of raw inbound updates.
//!
//! Submissions go through a small bounded queue. When the queue stays full for
//! longer than the enqueue timeout the update is dropped, so the webhook never
//! waits on the audit table.

use std::{future::Future, time::Duration};

use botcomod_db::table;
use sea_query::{Expr, ExprTrait, OnConflict, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::{SqliteExecutor, SqlitePool};
use time::OffsetDateTime;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::config::AuditConfig;

#[derive(Debug)]
struct Entry {
    id: i64,
    update: String,
}

#[derive(Clone)]
pub struct UpdateLogger {
    sender: mpsc::Sender<Entry>,
    enqueue_timeout: Duration,
}

impl UpdateLogger {
    /// Starts the single worker draining the queue. The worker stops once every
    /// `UpdateLogger` clone is dropped and the queue is empty.
    pub fn spawn(pool: SqlitePool, config: &AuditConfig) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let handle = tokio::spawn(run_worker(
            pool,
            receiver,
            config.retries,
            config.attempt_timeout(),
        ));

        (
            Self {
                sender,
                enqueue_timeout: config.enqueue_timeout(),
            },
            handle,
        )
    }

    /// Queues a raw update. Returns `false` when it was dropped.
    pub async fn log_update(&self, id: i64, update: impl Into<String>) -> bool {
        let entry = Entry {
            id,
            update: update.into(),
        };

        match self.sender.send_timeout(entry, self.enqueue_timeout).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(update_id = id, error = %err, "update dropped from audit queue");
                false
            }
        }
    }
}

async fn run_worker(
    pool: SqlitePool,
    mut receiver: mpsc::Receiver<Entry>,
    retries: u32,
    attempt_timeout: Duration,
) {
    while let Some(entry) = receiver.recv().await {
        let result = with_retry(retries, attempt_timeout, || store(&pool, entry.id, &entry.update)).await;

        if let Err(errors) = result {
            tracing::error!(update_id = entry.id, errors = ?errors, "failed to log update");
        }
    }

    tracing::debug!("audit worker stopped");
}

/// Runs `f` up to `retries` times, each attempt bounded by `attempt_timeout`.
/// On failure every attempt's error is returned.
pub async fn with_retry<F, Fut, E>(
    retries: u32,
    attempt_timeout: Duration,
    mut f: F,
) -> Result<(), Vec<String>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut errors = vec![];
    for _ in 0..retries {
        match tokio::time::timeout(attempt_timeout, f()).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(err)) => errors.push(err.to_string()),
            Err(_) => errors.push(format!("timed out after {attempt_timeout:?}")),
        }
    }

    Err(errors)
}

pub async fn store<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    update: &str,
) -> Result<(), sqlx::Error> {
    let timestamp = OffsetDateTime::now_utc().unix_timestamp();
    let statement = Query::insert()
        .into_table(table::UpdatesLog::Table)
        .columns([
            table::UpdatesLog::Id,
            table::UpdatesLog::Timestamp,
            table::UpdatesLog::Update,
        ])
        .values_panic([id.into(), timestamp.into(), update.into()])
        .on_conflict(
            OnConflict::column(table::UpdatesLog::Id)
                .update_columns([table::UpdatesLog::Timestamp, table::UpdatesLog::Update])
                .to_owned(),
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(executor).await?;

    Ok(())
}

pub async fn find<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Option<String>, sqlx::Error> {
    let statement = Query::select()
        .column(table::UpdatesLog::Update)
        .from(table::UpdatesLog::Table)
        .and_where(Expr::col(table::UpdatesLog::Id).eq(id))
        .limit(1)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, (String,), _>(&sql, values)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(|(update,)| update))
}
