//! Webhook test harness: a migrated temp-dir database, one house and the full router.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use botcomod::{
    AppState,
    audit::UpdateLogger,
    bot::Services,
    config::{AuditConfig, BotConfig},
};
use botcomod_house::{Houses, RoomRange, UpsertHouseInput};
use botcomod_shared::{callback::Callback, token::TokenCodec};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx_migrator::{Migrate, Plan};
use temp_dir::TempDir;
use tower::ServiceExt;

pub const ADMIN_ID: i64 = 1;
pub const REGISTRATION_CHAT_ID: i64 = -100;
pub const DEVELOPER_CHAT_ID: i64 = -200;
pub const WEBHOOK_SECRET: &str = "webhook-secret";
pub const TOKEN_SECRET: &str = "test_secret_key_minimum_32_characters_long";
pub const HOUSE: &str = "108А";
/// Id of [`HOUSE`], the only house in a fresh database.
pub const HOUSE_ID: &str = "1";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub tokens: TokenCodec,
    _dir: TempDir,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let dir = TempDir::new()?;
    let url = format!("sqlite:{}", dir.child("db.sqlite3").to_string_lossy());

    let pool = botcomod::db::create_pool(&url, 4).await?;
    let mut conn = pool.acquire().await?;
    botcomod_db::migrator()?
        .run(&mut conn, &Plan::apply_all())
        .await?;
    drop(conn);

    botcomod_house::upsert(
        &pool,
        UpsertHouseInput {
            number: HOUSE.to_owned(),
            construction: None,
            rooms: RoomRange { min: 1, max: 150 },
        },
    )
    .await?;

    let write_pool = botcomod::db::create_write_pool(&url).await?;
    let (audit, _worker) = UpdateLogger::spawn(pool.clone(), &AuditConfig::default());
    let services = Services {
        bot: BotConfig {
            username: "botcomod_bot".to_owned(),
            developer_chat_id: DEVELOPER_CHAT_ID,
            registration_chat_id: REGISTRATION_CHAT_ID,
            admins: vec![ADMIN_ID],
            webhook_secret: Some(WEBHOOK_SECRET.to_owned()),
        },
        houses: Houses::new(pool.clone(), std::time::Duration::from_secs(60)),
        tokens: TokenCodec::new(TOKEN_SECRET)?,
    };

    let router = botcomod::routes::router(AppState {
        pool: write_pool,
        services: Arc::new(services),
        audit,
    });

    Ok(TestApp {
        router,
        pool,
        tokens: TokenCodec::new(TOKEN_SECRET)?,
        _dir: dir,
    })
}

impl TestApp {
    pub async fn post_raw(&self, body: String, secret: Option<&str>) -> anyhow::Result<(StatusCode, Value)> {
        let mut request = Request::builder()
            .method("POST")
            .uri(botcomod::routes::WEBHOOK_PATH)
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            request = request.header(botcomod::routes::SECRET_HEADER, secret);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::from(body))?)
            .await?;

        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Ok((status, value))
    }

    /// Posts an update and returns the outbound actions.
    pub async fn post(&self, update: Value) -> anyhow::Result<Value> {
        let (status, outbox) = self.post_raw(update.to_string(), Some(WEBHOOK_SECRET)).await?;
        assert_eq!(status, StatusCode::OK, "{outbox}");

        Ok(outbox)
    }

    pub async fn text(&self, update_id: i64, from: i64, text: &str) -> anyhow::Result<Value> {
        self.post(message(update_id, from, json!({ "text": text }))).await
    }

    pub async fn press(&self, update_id: i64, from: i64, callback: Callback) -> anyhow::Result<Value> {
        self.post(button(update_id, from, from, &callback.encode()?)).await
    }

    /// Drives the registration wizard straight to its confirmed step.
    pub async fn register(&self, update_id: i64, user_id: i64, apartment: i64) -> anyhow::Result<Value> {
        let start = (apartment - 1) / 64 * 64 + 1;
        self.press(
            update_id,
            user_id,
            Callback::new("registration").args([HOUSE_ID.to_owned(), start.to_string(), apartment.to_string(), "OK".to_owned()]),
        )
        .await
    }

    /// Registration plus admin approval from the receipt photo.
    pub async fn make_resident(&self, update_id: i64, user_id: i64, apartment: i64) -> anyhow::Result<()> {
        self.register(update_id, user_id, apartment).await?;
        self.post(message(update_id + 1, user_id, json!({ "photo": [{"file_id": "f", "width": 1, "height": 1}] })))
            .await?;
        self.press(
            update_id + 2,
            ADMIN_ID,
            Callback::new("admin-approve-registration").arg(user_id),
        )
        .await?;

        Ok(())
    }
}

pub fn message(update_id: i64, from: i64, content: Value) -> Value {
    let mut message = json!({
        "message_id": update_id * 10,
        "from": { "id": from, "is_bot": false, "first_name": format!("User{from}"), "username": format!("user{from}") },
        "chat": { "id": from, "type": "private" },
        "date": 1700000000,
    });
    if let (Some(message), Some(content)) = (message.as_object_mut(), content.as_object()) {
        message.extend(content.clone());
    }

    json!({ "update_id": update_id, "message": message })
}

pub fn button(update_id: i64, from: i64, chat: i64, data: &str) -> Value {
    button_under(update_id, from, chat, "previous screen", data)
}

/// A button press on a message that reads `text`.
pub fn button_under(update_id: i64, from: i64, chat: i64, text: &str, data: &str) -> Value {
    json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("q{update_id}"),
            "from": { "id": from, "is_bot": false, "first_name": format!("User{from}"), "username": format!("user{from}") },
            "message": {
                "message_id": 1,
                "chat": { "id": chat, "type": "private" },
                "text": text
            },
            "data": data
        }
    })
}

fn actions(outbox: &Value) -> impl Iterator<Item = &Value> {
    outbox.as_array().into_iter().flatten()
}

/// Texts of every message sent or edited in `chat_id`.
pub fn texts_in(outbox: &Value, chat_id: i64) -> Vec<String> {
    actions(outbox)
        .filter(|action| action["chat_id"] == chat_id && action["text"].is_string())
        .filter_map(|action| action["text"].as_str().map(str::to_owned))
        .collect()
}

pub fn methods(outbox: &Value) -> Vec<String> {
    actions(outbox)
        .filter_map(|action| action["method"].as_str().map(str::to_owned))
        .collect()
}

/// Decoded payload of the first button labelled `text`.
pub fn find_button(outbox: &Value, text: &str) -> Option<Callback> {
    actions(outbox)
        .flat_map(|action| action["reply_markup"]["inline_keyboard"].as_array().into_iter().flatten())
        .flat_map(|row| row.as_array().into_iter().flatten())
        .find(|button| button["text"] == text)
        .and_then(|button| button["callback_data"].as_str())
        .and_then(|data| Callback::decode(data).ok())
}
