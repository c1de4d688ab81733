use botcomod_house::{RoomRange, UpsertHouseInput};

use crate::config::Config;

pub async fn add(
    config: &Config,
    number: String,
    rooms_min: i64,
    rooms_max: i64,
    construction: Option<String>,
) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(&config.database.url, 1).await?;

    botcomod_house::upsert(
        &pool,
        UpsertHouseInput {
            number,
            construction,
            rooms: RoomRange {
                min: rooms_min,
                max: rooms_max,
            },
        },
    )
    .await?;

    pool.close().await;

    Ok(())
}

pub async fn list(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(&config.database.url, 1).await?;

    for house in botcomod_house::list(&pool).await? {
        println!(
            "{}\t{}\t{}-{}\t{}",
            house.id,
            house.number,
            house.rooms.min,
            house.rooms.max,
            house.construction.unwrap_or_default()
        );
    }

    pool.close().await;

    Ok(())
}
