use botcomod_shared::callback::Callback;
use botcomod_user::AddApartmentInput;

use super::{
    context::Context,
    picker::{self, Step},
    reply::{Button, Keyboard},
    residents,
    route::Route,
};

const DECLINE_REASON: &str = "declined by admin";

pub async fn handle_add(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    if !residents::ensure_resident(ctx).await? {
        return Ok(());
    }

    let houses = ctx.services.houses.all().await?;
    let step = picker::parse(&callback.args, &houses).unwrap_or(Step::ChooseHouse);
    let Step::Confirmed { house, apartment } = step else {
        let keyboard = picker::keyboard(Route::AddApartment, &step, &houses)?;
        ctx.edit_or_reply(picker::prompt(&step), Some(keyboard));
        return Ok(());
    };

    let user_id = ctx.sender_id();
    let update_id = ctx.update_id();
    let apartment = apartment.to_string();
    ctx.users()
        .add_apartment(AddApartmentInput {
            user_id,
            update_id,
            house_id: house.id,
            apartment: apartment.clone(),
        })
        .await?;

    let args = [user_id.to_string(), house.id.to_string(), apartment.clone()];
    let keyboard = Keyboard::new().row(vec![
        Button::callback(
            "✅ Confirm",
            &Route::AdminConfirmApartment.callback().args(&args),
        )?,
        Button::callback(
            "❌ Decline",
            &Route::AdminDeclineApartment.callback().args(&args),
        )?,
    ]);

    let text = format!(
        "{} claims another apartment: house {} apartment {}.",
        ctx.sender_mention(),
        house.number,
        apartment
    );
    let registration_chat_id = ctx.services.bot.registration_chat_id;
    ctx.send(registration_chat_id, text, Some(keyboard));
    ctx.edit_or_reply(
        format!(
            "House {} apartment {} is waiting for an administrator to confirm it.",
            house.number, apartment
        ),
        Some(Keyboard::new().row(vec![picker::back_button()?])),
    );

    Ok(())
}

struct Claim {
    user_id: i64,
    house_id: i64,
    apartment: String,
}

fn claim(callback: &Callback) -> botcomod_shared::Result<Claim> {
    let parsed = match (callback.get(0), callback.get(1), callback.get(2)) {
        (Some(user_id), Some(house_id), Some(apartment)) => user_id
            .parse()
            .ok()
            .zip(house_id.parse().ok())
            .map(|(user_id, house_id)| Claim {
                user_id,
                house_id,
                apartment: apartment.to_owned(),
            }),
        _ => None,
    };

    parsed.ok_or_else(|| botcomod_shared::Error::Decode("malformed apartment claim".to_owned()))
}

pub async fn handle_admin_confirm(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;
    let claim = claim(callback)?;
    let admin_user_id = ctx.sender_id();
    ctx.users()
        .admin_confirm_apartment(claim.user_id, admin_user_id, claim.house_id, &claim.apartment)
        .await?;

    let text = format!("{}\nConfirmed", ctx.button_message_text());
    ctx.edit_or_reply(text, None);
    ctx.send(
        claim.user_id,
        format!("Apartment {} is confirmed.", claim.apartment),
        None,
    );

    Ok(())
}

pub async fn handle_admin_decline(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    ctx.ensure_admin()?;
    let claim = claim(callback)?;
    let admin_user_id = ctx.sender_id();
    ctx.users()
        .admin_decline_apartment(
            claim.user_id,
            admin_user_id,
            claim.house_id,
            &claim.apartment,
            DECLINE_REASON,
        )
        .await?;

    let text = format!("{}\nDeclined", ctx.button_message_text());
    ctx.edit_or_reply(text, None);
    ctx.send(
        claim.user_id,
        format!("Apartment {} was not confirmed.", claim.apartment),
        None,
    );

    Ok(())
}
