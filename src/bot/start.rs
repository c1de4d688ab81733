//! `/start <token>`: the deep link an administrator sends to finish a registration.

use botcomod_shared::user::ApproveToken;
use botcomod_user::ApproveOutcome;

use super::{context::Context, menu};

pub async fn handle(ctx: &mut Context<'_>, payload: &str) -> botcomod_shared::Result<()> {
    if payload.is_empty() {
        return menu::show(ctx).await;
    }

    // A broken token looks like a plain /start, whatever went wrong with it.
    let token: ApproveToken = match ctx.services.tokens.decode(payload) {
        Ok(token) => token,
        Err(err) => {
            tracing::warn!(user_id = ctx.sender_id(), error = %err, "start token rejected");
            return menu::show(ctx).await;
        }
    };

    let user_id = ctx.sender_id();
    if token.user_id != user_id {
        tracing::warn!(user_id, token_user_id = token.user_id, "start token of another user");
        ctx.reply("This link was issued for another user.", None);
        return Ok(());
    }

    let update_id = ctx.update_id();
    let outcome = ctx
        .users()
        .check_approve_code(user_id, update_id, &token.approve_code)
        .await?;

    let text = match outcome {
        ApproveOutcome::NoPendingRegistration => "There is no registration waiting for confirmation.",
        ApproveOutcome::Confirmed => {
            "Registration is complete. The residents section is now available to you.\n/help"
        }
        ApproveOutcome::Failed => "The code does not match. Registration failed.",
    };
    ctx.reply(text, None);

    Ok(())
}
