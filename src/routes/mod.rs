use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;

use crate::{audit::UpdateLogger, bot::Services};

mod health;
mod webhook;

pub const WEBHOOK_PATH: &str = "/telegram/webhook";
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct AppState {
    /// Single-connection pool; every update runs in a transaction on it.
    pub pool: SqlitePool,
    pub services: Arc<Services>,
    pub audit: UpdateLogger,
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        // Health check endpoints (no auth required)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .with_state(app_state.pool.clone())
        .route(WEBHOOK_PATH, post(webhook::action))
        .with_state(app_state)
}
