use botcomod_user::{Command, Query};
use temp_dir::TempDir;

mod helpers;

#[tokio::test]
async fn unknown_event_type_fails_the_whole_replay() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    Command::new(&mut conn)
        .register_car_license_plate(1, 1, "X703BX96")
        .await?;
    sqlx::query(
        r#"INSERT INTO "user_event" ("user", "timestamp", "id", "type", "event") VALUES (1, 9223372036854775807, 'z', '*bot.legacyEvent', '{}')"#,
    )
    .execute(&mut *conn)
    .await?;

    let err = Command::new(&mut conn).load(1).await.unwrap_err();
    assert_eq!(err.to_string(), "unknown event type `*bot.legacyEvent`");

    let err = Query::new(&mut conn).all_users().await.unwrap_err();
    assert!(matches!(err, botcomod_shared::Error::Decode(_)));

    Ok(())
}

#[tokio::test]
async fn malformed_payload_fails_the_replay() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    sqlx::query(
        r#"INSERT INTO "user_event" ("user", "timestamp", "id", "type", "event") VALUES (1, 1, 'a', '*bot.registerCarLicensePlateEvent', 'not json')"#,
    )
    .execute(&mut *conn)
    .await?;

    let err = Command::new(&mut conn).load(1).await.unwrap_err();
    assert!(matches!(err, botcomod_shared::Error::Decode(_)));

    Ok(())
}

#[tokio::test]
async fn historical_rows_replay_in_timestamp_then_id_order() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    let start = r#"{"UpdateID":1,"HouseNumber":"4","HouseID":4,"Appartment":"3","ApproveCode":"3A2CX","InvalidCodes":null}"#;
    let confirm = r#"{"UpdateID":2,"WithCode":"3A2CX"}"#;
    for (timestamp, id, tag, event) in [
        (20, "b", "*bot.confirmRegistrationEvent", confirm),
        (10, "z", "*bot.startRegistrationEvent", start),
    ] {
        sqlx::query(r#"INSERT INTO "user_event" ("user", "timestamp", "id", "type", "event") VALUES (?, ?, ?, ?, ?)"#)
            .bind(1_i64)
            .bind(timestamp as i64)
            .bind(id)
            .bind(tag)
            .bind(event)
            .execute(&mut *conn)
            .await?;
    }

    let mut cmd = Command::new(&mut conn);
    let user = cmd.load(1).await?;
    assert!(user.is_approved_resident);

    let events = cmd.events(1).await?;
    assert_eq!(
        events.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
        vec!["z", "b"]
    );

    Ok(())
}

#[tokio::test]
async fn clear_events_erases_history() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    let mut cmd = Command::new(&mut conn);
    cmd.register_car_license_plate(1, 1, "X703BX96").await?;
    cmd.register_car_license_plate(2, 1, "A001AA77").await?;

    assert_eq!(cmd.clear_events(1).await?, 1);
    assert!(cmd.load(1).await?.cars.is_empty());
    assert_eq!(cmd.load(2).await?.cars.len(), 1);

    Ok(())
}
