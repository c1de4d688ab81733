use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};

use super::{AppState, SECRET_HEADER};
use crate::{
    bot::{self, Outbound, Update},
    error::AppError,
};

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(secret) = &state.services.bot.webhook_secret else {
        return true;
    };

    headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == secret)
}

/// POST /telegram/webhook
///
/// Answers with the Bot API calls the relay has to make for this update.
pub async fn action(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Vec<Outbound>>, AppError> {
    if !authorized(&state, &headers) {
        tracing::warn!("webhook call with a wrong secret");
        return Err(AppError::Unauthorized);
    }

    let update: Update = serde_json::from_slice(&body)?;
    let raw = String::from_utf8_lossy(&body).into_owned();
    state.audit.log_update(update.update_id, raw).await;

    let outbox = bot::process(&state.pool, &state.services, &update).await?;

    Ok(Json(outbox))
}
