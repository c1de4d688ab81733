use botcomod_shared::{callback::Callback, user::ApproveToken};
use botcomod_user::StartRegistrationInput;
use url::Url;

use super::{
    context::Context,
    picker::{self, Step},
    reply::{Button, Keyboard},
    route::Route,
};

/// Code used when an admin approves from the receipt photo rather than a deep link.
pub const RECEIPT_CODE: &str = "receipt";

const PENDING_TEXT: &str = "Registration has already started. To finish it, send a photo of your utility bill so we can make sure you live here.";

/// `https://t.me/<bot>?start=<token>`
pub fn deep_link(bot_username: &str, token: &str) -> botcomod_shared::Result<Url> {
    let base = format!("https://t.me/{bot_username}");
    Url::parse_with_params(&base, [("start", token)])
        .map_err(|e| botcomod_shared::Error::Server(format!("deep link: {e}")))
}

/// Signed deep link that confirms the registration of `user_id` when opened.
pub fn approve_link(ctx: &Context<'_>, user_id: i64, approve_code: &str) -> botcomod_shared::Result<Url> {
    let token = ctx.services.tokens.encode(&ApproveToken {
        user_id,
        approve_code: approve_code.to_owned(),
    })?;

    deep_link(&ctx.services.bot.username, &token)
}

pub async fn handle_wizard(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    let user = ctx.me().await?;
    if user.pending_registration().is_some() {
        ctx.edit_or_reply(PENDING_TEXT, None);
        return Ok(());
    }

    let houses = ctx.services.houses.all().await?;
    let Some(step) = picker::parse(&callback.args, &houses) else {
        tracing::warn!(args = ?callback.args, "unreachable registration step");
        ctx.edit_or_reply(
            "Something went wrong, let's start over.",
            Some(picker::keyboard(Route::Registration, &Step::ChooseHouse, &houses)?),
        );
        return Ok(());
    };

    let Step::Confirmed { house, apartment } = step else {
        let keyboard = picker::keyboard(Route::Registration, &step, &houses)?;
        ctx.edit_or_reply(picker::prompt(&step), Some(keyboard));
        return Ok(());
    };

    let user_id = ctx.sender_id();
    let update_id = ctx.update_id();
    let code = ctx
        .users()
        .start_registration(StartRegistrationInput {
            user_id,
            update_id,
            house_id: house.id,
            house_number: house.number.clone(),
            apartment: apartment.to_string(),
        })
        .await?;
    let link = approve_link(ctx, user_id, &code)?;

    ctx.edit_or_reply(
        "To finish registration, send a photo of your utility bill for the apartment. This is how we make sure you live here.",
        Some(Keyboard::new().row(vec![picker::back_button()?])),
    );
    let text = format!(
        "New registration from {}. House {} apartment {}. Code: {}\n{}",
        ctx.sender_mention(),
        house.number,
        apartment,
        code,
        link
    );
    let registration_chat_id = ctx.services.bot.registration_chat_id;
    ctx.send(registration_chat_id, text, None);

    Ok(())
}

/// Forwards a receipt photo to the registration chat. Returns `false` when the
/// sender has nothing to confirm.
pub async fn handle_photo(ctx: &mut Context<'_>) -> botcomod_shared::Result<bool> {
    let user = ctx.me().await?;
    let Some(registration) = user.pending_registration() else {
        return Ok(false);
    };

    let user_id = ctx.sender_id();
    let args = [user_id];
    let keyboard = Keyboard::new().row(vec![
        Button::callback(
            "✅ Matches",
            &Route::AdminApproveRegistration.callback().args(args),
        )?,
        Button::callback(
            "❌ Unreadable",
            &Route::AdminDisapproveRegistration.callback().args(args),
        )?,
        Button::callback(
            "🔐 Reject",
            &Route::AdminFailRegistration.callback().args(args),
        )?,
    ]);

    let text = format!(
        "Photo from {} ({}). Registration for house {} apartment {}.\nCompare with the bill. Does it match?",
        ctx.sender_mention(),
        ctx.sender.first_name,
        registration.house_number,
        registration.apartment
    );
    let registration_chat_id = ctx.services.bot.registration_chat_id;
    ctx.reply("Thank you. We will check it and let you know.", None);
    ctx.forward_to(registration_chat_id);
    ctx.send(registration_chat_id, text, Some(keyboard));

    Ok(true)
}

fn target_user(callback: &Callback) -> botcomod_shared::Result<i64> {
    callback
        .get(0)
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| botcomod_shared::Error::Decode("registration callback without user id".to_owned()))
}

pub async fn handle_admin_approve(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;
    let user_id = target_user(callback)?;
    let update_id = ctx.update_id();
    ctx.users()
        .confirm_registration(user_id, update_id, RECEIPT_CODE)
        .await?;

    tracing::info!(user_id, admin_user_id = ctx.sender_id(), "registration approved");

    let text = format!("{}\nRegistration completed", ctx.button_message_text());
    ctx.edit_or_reply(text, None);
    ctx.send(
        user_id,
        "Registration is complete. The residents section is now available to you.\n/help",
        None,
    );

    Ok(())
}

pub async fn handle_admin_disapprove(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;
    let user_id = target_user(callback)?;

    let text = format!("{}\nAsked for another photo", ctx.button_message_text());
    ctx.edit_or_reply(text, None);
    ctx.send(
        user_id,
        "Registration is not complete yet. The photo is hard to read. Please send a sharper one where the address and apartment number are readable.",
        None,
    );

    Ok(())
}

pub async fn handle_admin_fail(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;
    let user_id = target_user(callback)?;
    let update_id = ctx.update_id();
    ctx.users()
        .fail_registration(user_id, update_id, RECEIPT_CODE)
        .await?;

    tracing::info!(user_id, admin_user_id = ctx.sender_id(), "registration failed");

    let text = format!("{}\nRegistration failed", ctx.button_message_text());
    ctx.edit_or_reply(text, None);
    ctx.send(
        user_id,
        "Registration failed. The apartment on the bill does not match the one given during registration.",
        None,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_links_carry_the_token_as_start_parameter() {
        let link = deep_link("botcomod_bot", "eJyrVkrOz0vJTEtXslJQ").unwrap();

        assert_eq!(
            link.as_str(),
            "https://t.me/botcomod_bot?start=eJyrVkrOz0vJTEtXslJQ"
        );
    }
}
