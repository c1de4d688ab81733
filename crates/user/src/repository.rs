use botcomod_db::table;
use botcomod_shared::user::DomainEvent;
use futures::TryStreamExt;
use sea_query::{Expr, ExprTrait, OnConflict, Order, Query, SelectStatement, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::{SqliteConnection, prelude::FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// One row of the append-only user event log.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub user_id: i64,
    pub timestamp: OffsetDateTime,
    pub id: String,
    pub event: DomainEvent,
}

#[derive(FromRow)]
struct EventRow {
    user: i64,
    timestamp: i64,
    id: String,
    #[sqlx(rename = "type")]
    kind: String,
    event: String,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = botcomod_shared::Error;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let event = DomainEvent::decode(&row.kind, &row.event)?;
        let timestamp = OffsetDateTime::from_unix_timestamp_nanos(i128::from(row.timestamp))
            .map_err(|e| botcomod_shared::Error::Decode(e.to_string()))?;

        Ok(Self {
            user_id: row.user,
            timestamp,
            id: row.id,
            event,
        })
    }
}

fn now_nanos() -> botcomod_shared::Result<i64> {
    i64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos())
        .map_err(|e| botcomod_shared::Error::Server(e.to_string()))
}

pub(crate) async fn append(
    conn: &mut SqliteConnection,
    user_id: i64,
    event: &DomainEvent,
) -> botcomod_shared::Result<()> {
    let payload = event.to_json()?;
    let id = Uuid::new_v4().to_string();

    let statement = Query::insert()
        .into_table(table::UserEvent::Table)
        .columns([
            table::UserEvent::User,
            table::UserEvent::Timestamp,
            table::UserEvent::Id,
            table::UserEvent::Type,
            table::UserEvent::Event,
        ])
        .values_panic([
            user_id.into(),
            now_nanos()?.into(),
            id.clone().into(),
            event.tag().into(),
            payload.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    tracing::debug!(user_id, id = %id, tag = event.tag(), "user event appended");

    Ok(())
}

fn select_events(user_id: Option<i64>) -> SelectStatement {
    let mut statement = Query::select()
        .columns([
            table::UserEvent::User,
            table::UserEvent::Timestamp,
            table::UserEvent::Id,
            table::UserEvent::Type,
            table::UserEvent::Event,
        ])
        .from(table::UserEvent::Table)
        .order_by(table::UserEvent::User, Order::Asc)
        .order_by(table::UserEvent::Timestamp, Order::Asc)
        .order_by(table::UserEvent::Id, Order::Asc)
        .to_owned();

    if let Some(user_id) = user_id {
        statement.and_where(Expr::col(table::UserEvent::User).eq(user_id));
    }

    statement
}

/// Streams events ordered by `(user, timestamp, id)` into `f`.
///
/// Decoding stops at the first row that cannot be decoded.
pub(crate) async fn for_each_ordered(
    conn: &mut SqliteConnection,
    user_id: Option<i64>,
    mut f: impl FnMut(EventRecord),
) -> botcomod_shared::Result<()> {
    let (sql, values) = select_events(user_id).build_sqlx(SqliteQueryBuilder);
    let mut rows = sqlx::query_as_with::<_, EventRow, _>(&sql, values).fetch(conn);

    while let Some(row) = rows.try_next().await? {
        f(EventRecord::try_from(row)?);
    }

    Ok(())
}

pub(crate) async fn clear(conn: &mut SqliteConnection, user_id: i64) -> botcomod_shared::Result<u64> {
    let statement = Query::delete()
        .from_table(table::UserEvent::Table)
        .and_where(Expr::col(table::UserEvent::User).eq(user_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let result = sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(result.rows_affected())
}

pub(crate) async fn upsert_username(
    conn: &mut SqliteConnection,
    user_id: i64,
    username: Option<String>,
) -> botcomod_shared::Result<()> {
    let statement = Query::insert()
        .into_table(table::User::Table)
        .columns([table::User::Id, table::User::Username])
        .values_panic([user_id.into(), username.into()])
        .on_conflict(
            OnConflict::column(table::User::Id)
                .update_column(table::User::Username)
                .to_owned(),
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

#[derive(FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: Option<String>,
}

pub(crate) async fn find_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> botcomod_shared::Result<Option<UserRow>> {
    let statement = Query::select()
        .columns([table::User::Id, table::User::Username])
        .from(table::User::Table)
        .and_where(Expr::col(table::User::Id).eq(user_id))
        .limit(1)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    Ok(sqlx::query_as_with::<_, UserRow, _>(&sql, values)
        .fetch_optional(conn)
        .await?)
}

pub(crate) async fn all_users(conn: &mut SqliteConnection) -> botcomod_shared::Result<Vec<UserRow>> {
    let statement = Query::select()
        .columns([table::User::Id, table::User::Username])
        .from(table::User::Table)
        .order_by(table::User::Id, Order::Asc)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    Ok(sqlx::query_as_with::<_, UserRow, _>(&sql, values)
        .fetch_all(conn)
        .await?)
}
