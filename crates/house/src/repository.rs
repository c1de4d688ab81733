use botcomod_db::table;
use sea_query::{Expr, ExprTrait, OnConflict, Order, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::{SqliteExecutor, prelude::FromRow};
use validator::Validate;

use crate::{House, RoomRange};

#[derive(FromRow)]
struct HouseRow {
    id: i64,
    number: String,
    construction: Option<String>,
    rooms_min: i64,
    rooms_max: i64,
}

impl From<HouseRow> for House {
    fn from(row: HouseRow) -> Self {
        Self {
            id: row.id,
            number: row.number,
            construction: row.construction,
            rooms: RoomRange {
                min: row.rooms_min,
                max: row.rooms_max,
            },
        }
    }
}

pub async fn list<'e>(executor: impl SqliteExecutor<'e>) -> botcomod_shared::Result<Vec<House>> {
    let statement = Query::select()
        .columns([
            table::House::Id,
            table::House::Number,
            table::House::Construction,
            table::House::RoomsMin,
            table::House::RoomsMax,
        ])
        .from(table::House::Table)
        .order_by(table::House::Id, Order::Asc)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let rows = sqlx::query_as_with::<_, HouseRow, _>(&sql, values)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(House::from).collect())
}

#[derive(Validate)]
pub struct UpsertHouseInput {
    #[validate(length(min = 1, max = 32, message = "house number must be 1 to 32 characters"))]
    pub number: String,
    #[validate(length(max = 64))]
    pub construction: Option<String>,
    #[validate(nested)]
    pub rooms: RoomRange,
}

/// Inserts a house or updates the one with the same number.
pub async fn upsert<'e>(
    executor: impl SqliteExecutor<'e>,
    input: UpsertHouseInput,
) -> botcomod_shared::Result<()> {
    let input = UpsertHouseInput {
        number: input.number.trim().to_owned(),
        ..input
    };
    input.validate()?;
    let number = input.number;

    let statement = Query::insert()
        .into_table(table::House::Table)
        .columns([
            table::House::Number,
            table::House::Construction,
            table::House::RoomsMin,
            table::House::RoomsMax,
        ])
        .values_panic([
            number.clone().into(),
            input.construction.into(),
            input.rooms.min.into(),
            input.rooms.max.into(),
        ])
        .on_conflict(
            OnConflict::column(table::House::Number)
                .update_columns([
                    table::House::Construction,
                    table::House::RoomsMin,
                    table::House::RoomsMax,
                ])
                .to_owned(),
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(executor).await?;

    tracing::info!(number = %number, "house saved");

    Ok(())
}

pub async fn find_by_number<'e>(
    executor: impl SqliteExecutor<'e>,
    number: &str,
) -> botcomod_shared::Result<House> {
    let statement = Query::select()
        .columns([
            table::House::Id,
            table::House::Number,
            table::House::Construction,
            table::House::RoomsMin,
            table::House::RoomsMax,
        ])
        .from(table::House::Table)
        .and_where(Expr::col(table::House::Number).eq(number))
        .limit(1)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, HouseRow, _>(&sql, values)
        .fetch_optional(executor)
        .await?;

    match row {
        Some(row) => Ok(row.into()),
        None => botcomod_shared::not_found!("house"),
    }
}
