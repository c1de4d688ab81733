use std::{path::PathBuf, str::FromStr, time::Duration};

use botcomod_user::StartRegistrationInput;
use sqlx::{
    SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use sqlx_migrator::{Migrate, Plan};

pub async fn setup_test_pool(path: PathBuf) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.to_str().unwrap()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePool::connect_with(opts).await?;
    let mut conn = pool.acquire().await?;
    botcomod_db::migrator()?
        .run(&mut conn, &Plan::apply_all())
        .await?;

    Ok(pool)
}

#[allow(dead_code)]
pub async fn start_registration(
    conn: &mut SqliteConnection,
    user_id: i64,
    house_id: i64,
    apartment: &str,
) -> anyhow::Result<String> {
    let code = botcomod_user::Command::new(conn)
        .start_registration(StartRegistrationInput {
            user_id,
            update_id: 1,
            house_id,
            house_number: house_id.to_string(),
            apartment: apartment.to_owned(),
        })
        .await?;

    Ok(code)
}
