use super::{
    context::Context,
    reply::{Button, Keyboard},
    route::Route,
};

const HELP: &str = "I am the residents' bot.\n\
/start - main menu\n\
/whois <plate> - find the owner of a car\n\
/help - this message";

/// Main menu; what it offers depends on the sender's residency.
pub async fn show(ctx: &mut Context<'_>) -> botcomod_shared::Result<()> {
    let user = ctx.me().await?;

    if user.is_resident() {
        let keyboard = Keyboard::new()
            .row(vec![Button::callback("🚗 My car", &Route::RegisterCar.callback())?])
            .row(vec![Button::callback("🔎 Whose car is it?", &Route::Whois.callback())?])
            .row(vec![Button::callback("🏠 Find a neighbour", &Route::FindResident.callback())?])
            .row(vec![Button::callback("➕ Add an apartment", &Route::AddApartment.callback())?]);
        ctx.edit_or_reply("Residents menu", Some(keyboard));
        return Ok(());
    }

    if user.pending_registration().is_some() {
        ctx.edit_or_reply(
            "Your registration is waiting for a photo of your utility bill. Send it here and an administrator will check it.",
            None,
        );
        return Ok(());
    }

    let keyboard = Keyboard::new().row(vec![Button::callback(
        "📒 Start registration",
        &Route::Registration.callback(),
    )?]);
    ctx.edit_or_reply(
        "Hello! Register as a resident to find neighbours and car owners.",
        Some(keyboard),
    );

    Ok(())
}

pub fn help(ctx: &mut Context<'_>) {
    ctx.reply(HELP, None);
}
