use crate::config::Config;

/// Prints the replayed aggregate of a user.
pub async fn show(config: &Config, user_id: i64) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(&config.database.url, 1).await?;
    let mut conn = pool.acquire().await?;

    let user = botcomod_user::Command::new(&mut conn).load(user_id).await?;
    println!("{}", serde_json::to_string_pretty(&user)?);

    drop(conn);
    pool.close().await;

    Ok(())
}

pub async fn clear_events(config: &Config, user_id: i64) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(&config.database.url, 1).await?;
    let mut conn = pool.acquire().await?;

    let removed = botcomod_user::Command::new(&mut conn)
        .clear_events(user_id)
        .await?;
    tracing::info!("removed {removed} events of user {user_id}");

    drop(conn);
    pool.close().await;

    Ok(())
}
