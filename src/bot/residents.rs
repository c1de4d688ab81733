use botcomod_shared::callback::Callback;
use botcomod_user::User;

use super::{
    context::Context,
    picker::{self, Step},
    reply::{Button, Keyboard},
    route::Route,
};

/// Replies with a hint and returns `false` when the sender is not a confirmed resident.
pub async fn ensure_resident(ctx: &mut Context<'_>) -> botcomod_shared::Result<bool> {
    if ctx.me().await?.is_resident() {
        return Ok(true);
    }

    ctx.edit_or_reply(
        "This section is only for confirmed residents. Finish the registration first.\n/help",
        None,
    );

    Ok(false)
}

pub async fn handle_find(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    if !ensure_resident(ctx).await? {
        return Ok(());
    }

    let houses = ctx.services.houses.all().await?;
    let step = picker::parse(&callback.args, &houses).unwrap_or(Step::ChooseHouse);
    let Step::Confirmed { house, apartment } = step else {
        let keyboard = picker::keyboard(Route::FindResident, &step, &houses)?;
        ctx.edit_or_reply(picker::prompt(&step), Some(keyboard));
        return Ok(());
    };

    let apartment = apartment.to_string();
    let found = ctx
        .query()
        .find_by_apartment(house.id, &house.number, &apartment)
        .await;

    match found {
        Ok(resident) => {
            let about = format!("house {} apartment {}", house.number, apartment);
            request_contact(ctx, &resident, &about)
        }
        Err(err) if err.is_not_found() => {
            ctx.edit_or_reply(
                format!(
                    "Nobody from house {} apartment {} is registered yet.",
                    house.number, apartment
                ),
                Some(Keyboard::new().row(vec![picker::back_button()?])),
            );
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Asks `target` whether the sender may get their contact.
pub fn request_contact(ctx: &mut Context<'_>, target: &User, about: &str) -> botcomod_shared::Result<()> {
    if target.id == ctx.sender_id() {
        ctx.edit_or_reply("That's you 🙂", None);
        return Ok(());
    }

    let requester = [ctx.sender_id()];
    let keyboard = Keyboard::new().row(vec![
        Button::callback("✅ Share my contact", &Route::ContactAllow.callback().args(requester))?,
        Button::callback("❌ No, thanks", &Route::ContactDeny.callback().args(requester))?,
    ]);

    tracing::info!(
        requester_id = ctx.sender_id(),
        target_id = target.id,
        "contact requested"
    );

    let text = format!(
        "{} would like to get in touch about {}. Share your contact with them?",
        request_heading(&ctx.sender_mention()),
        about
    );
    ctx.send(target.id, text, Some(keyboard));
    ctx.edit_or_reply(
        "Request sent. If they agree, you will receive their contact.",
        None,
    );

    Ok(())
}

fn request_heading(requester_mention: &str) -> String {
    format!("Resident {requester_mention}")
}

/// The requester id comes back from the client, so it only counts when the
/// pressed button sits under the request that user sent to the sender.
fn is_request_from(ctx: &Context<'_>, requester: &User) -> bool {
    ctx.chat_id == ctx.sender_id()
        && ctx
            .button_message_text()
            .starts_with(&format!("{} would like", request_heading(&requester.mention())))
}

pub async fn handle_answer(ctx: &mut Context<'_>, callback: &Callback, allowed: bool) -> botcomod_shared::Result<()> {
    let requester_id: i64 = callback
        .get(0)
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| botcomod_shared::Error::Decode("contact answer without requester".to_owned()))?;

    let requester = ctx.users().load(requester_id).await?;
    if requester_id == ctx.sender_id() || !is_request_from(ctx, &requester) {
        tracing::warn!(requester_id, target_id = ctx.sender_id(), "contact answer outside a request");
        return Err(botcomod_shared::Error::Forbidden);
    }

    let (reply, suffix) = if allowed {
        (
            format!("{} agreed to talk, you can write to them.", ctx.sender_mention()),
            "Contact shared",
        )
    } else {
        (
            "The resident preferred not to share their contact.".to_owned(),
            "Declined",
        )
    };

    tracing::info!(requester_id, target_id = ctx.sender_id(), allowed, "contact request answered");

    let text = format!("{}\n{}", ctx.button_message_text(), suffix);
    ctx.edit_or_reply(text, None);
    ctx.send(requester_id, reply, None);

    Ok(())
}
