use botcomod_user::{EventRecord, StartRegistrationInput};
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;

use super::{context::Context, registration};
use crate::audit;

fn parse_id(payload: &str) -> Option<i64> {
    payload.split_whitespace().next()?.parse().ok()
}

fn event_json(record: &EventRecord) -> botcomod_shared::Result<Value> {
    let timestamp = record
        .timestamp
        .format(&Rfc3339)
        .map_err(|e| botcomod_shared::Error::Server(e.to_string()))?;

    Ok(json!({
        "timestamp": timestamp,
        "id": record.id,
        "type": record.event.tag(),
        "event": serde_json::from_str::<Value>(&record.event.to_json()?)?,
    }))
}

/// `/whoami [id]`: the replayed aggregate and its history. Anyone may look at themself.
pub async fn whoami(ctx: &mut Context<'_>, payload: &str) -> botcomod_shared::Result<()> {
    let user_id = parse_id(payload).unwrap_or(ctx.sender_id());
    if user_id != ctx.sender_id() {
        ctx.ensure_admin()?;
    }

    let user = ctx.users().load(user_id).await?;
    let events = ctx
        .users()
        .events(user_id)
        .await?
        .iter()
        .map(event_json)
        .collect::<botcomod_shared::Result<Vec<_>>>()?;

    let text = serde_json::to_string_pretty(&json!({ "user": user, "events": events }))?;
    ctx.reply(text, None);

    Ok(())
}

/// `/manual_register <user> <house number> <apartment>`
pub async fn manual_register(ctx: &mut Context<'_>, payload: &str) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;

    let parts: Vec<&str> = payload.split_whitespace().collect();
    let [user_id, house_number, apartment] = parts.as_slice() else {
        ctx.reply("Usage: /manual_register <user id> <house number> <apartment>", None);
        return Ok(());
    };

    let Ok(user_id) = user_id.parse::<i64>() else {
        ctx.reply("User id must be a number", None);
        return Ok(());
    };

    let Some(house) = ctx.services.houses.by_number(house_number).await? else {
        ctx.reply(format!("Unknown house {house_number}"), None);
        return Ok(());
    };

    let update_id = ctx.update_id();
    let code = ctx
        .users()
        .start_registration(StartRegistrationInput {
            user_id,
            update_id,
            house_id: house.id,
            house_number: house.number.clone(),
            apartment: (*apartment).to_owned(),
        })
        .await?;
    let link = registration::approve_link(ctx, user_id, &code)?;

    tracing::info!(user_id, admin_user_id = ctx.sender_id(), "manual registration started");
    ctx.reply(format!("Registration started. Code: {code}\n{link}"), None);

    Ok(())
}

/// `/clear_events <user>`
pub async fn clear_events(ctx: &mut Context<'_>, payload: &str) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;

    let Some(user_id) = parse_id(payload) else {
        ctx.reply("Usage: /clear_events <user id>", None);
        return Ok(());
    };

    let removed = ctx.users().clear_events(user_id).await?;
    ctx.reply(format!("Removed {removed} events of user {user_id}"), None);

    Ok(())
}

/// `/update <id>`: the raw update as it was logged.
pub async fn update(ctx: &mut Context<'_>, payload: &str) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;

    let Some(update_id) = parse_id(payload) else {
        ctx.reply("Usage: /update <update id>", None);
        return Ok(());
    };

    match audit::find(ctx.conn(), update_id).await? {
        Some(raw) => ctx.reply(raw, None),
        None => ctx.reply(format!("Update {update_id} is not logged"), None),
    }

    Ok(())
}

pub fn reload_houses(ctx: &mut Context<'_>) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;

    ctx.services.houses.invalidate();
    tracing::info!(admin_user_id = ctx.sender_id(), "house cache invalidated");
    ctx.reply("Houses will be reloaded on next use", None);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_read_from_the_first_word() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 42 extra"), Some(42));
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("abc"), None);
    }
}
