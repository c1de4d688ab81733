//! On-screen plate keyboard. The partial plate is the whole wizard state and
//! travels as the first button argument.

use botcomod_shared::callback::Callback;
use botcomod_user::plate::{self, Next};

use super::{
    context::Context,
    picker,
    reply::{Button, Keyboard},
    residents,
    route::Route,
};

const DONE: &str = "OK";
const LETTERS_PER_ROW: usize = 4;
const DIGIT_ROWS: [&str; 4] = ["789", "456", "123", "0"];

pub fn plate_keyboard(route: Route, plate: &str) -> botcomod_shared::Result<Keyboard> {
    let next = plate::next_character(plate);
    let key = |c: char| {
        Button::callback(
            c.to_string(),
            &route.callback().arg(format!("{plate}{c}")),
        )
    };

    let mut keyboard = Keyboard::new();
    if next.contains(Next::LETTER) {
        let letters: Vec<char> = plate::LETTERS.chars().collect();
        for row in letters.chunks(LETTERS_PER_ROW) {
            keyboard = keyboard.row(row.iter().map(|c| key(*c)).collect::<botcomod_shared::Result<_>>()?);
        }
    }

    if next.contains(Next::DIGIT) {
        for row in DIGIT_ROWS {
            keyboard = keyboard.row(row.chars().map(&key).collect::<botcomod_shared::Result<_>>()?);
        }
    }

    let mut controls = vec![];
    if !plate.is_empty() {
        let mut shorter = plate.to_owned();
        shorter.pop();
        controls.push(Button::callback("✖", &route.callback().arg(""))?);
        controls.push(Button::callback("⌫", &route.callback().arg(shorter))?);
    }
    if next.contains(Next::END) {
        controls.push(Button::callback(
            "✅ Done",
            &route.callback().arg(plate).arg(DONE),
        )?);
    }

    Ok(keyboard.row(controls).row(vec![picker::back_button()?]))
}

fn render(ctx: &mut Context<'_>, route: Route, title: &str, plate: &str) -> botcomod_shared::Result<()> {
    let shown = if plate.is_empty() { "_" } else { plate };
    let keyboard = plate_keyboard(route, plate)?;
    ctx.edit_or_reply(
        format!("{title}\n\n{shown}\n\n{}", plate::hint(plate)),
        Some(keyboard),
    );

    Ok(())
}

/// `(plate, done)` from button arguments; an impossible prefix starts over.
fn state(callback: &Callback) -> (String, bool) {
    let plate = plate::normalize(callback.get(0).unwrap_or_default());
    if plate::next_character(&plate) == Next::NONE {
        return (String::new(), false);
    }

    let done = callback.get(1) == Some(DONE) && plate::is_complete(&plate);
    (plate, done)
}

pub async fn handle_register(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    if !residents::ensure_resident(ctx).await? {
        return Ok(());
    }

    let (plate, done) = state(callback);
    if !done {
        return render(ctx, Route::RegisterCar, "🚗 Enter your car's license plate", &plate);
    }

    let user_id = ctx.sender_id();
    let update_id = ctx.update_id();
    let plate = ctx
        .users()
        .register_car_license_plate(user_id, update_id, &plate)
        .await?;

    tracing::info!(user_id, license_plate = %plate, "car registered");
    ctx.edit_or_reply(
        format!("🚗 Car {plate} is registered. Neighbours can now reach you if it blocks someone."),
        Some(Keyboard::new().row(vec![picker::back_button()?])),
    );

    Ok(())
}

pub async fn handle_whois(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    if !residents::ensure_resident(ctx).await? {
        return Ok(());
    }

    let (plate, done) = state(callback);
    if !done {
        return render(ctx, Route::Whois, "🔎 Whose car is it? Enter the license plate", &plate);
    }

    find_owner(ctx, &plate).await
}

/// `/whois X703BX96` skips the keyboard when the plate is already complete.
pub async fn handle_whois_command(ctx: &mut Context<'_>, payload: &str) -> botcomod_shared::Result<()> {
    let plate = plate::normalize(payload);
    let done = if plate::is_complete(&plate) { DONE } else { "" };

    handle_whois(ctx, &Route::Whois.callback().arg(plate).arg(done)).await
}

async fn find_owner(ctx: &mut Context<'_>, plate: &str) -> botcomod_shared::Result<()> {
    match ctx.query().find_by_license_plate(plate).await {
        Ok(owner) => residents::request_contact(ctx, &owner, &format!("the car {plate}")),
        Err(err) if err.is_not_found() => {
            ctx.edit_or_reply(
                format!("Nobody has registered the car {plate} yet."),
                Some(Keyboard::new().row(vec![picker::back_button()?])),
            );
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(keyboard: &Keyboard) -> Vec<Vec<&str>> {
        keyboard
            .inline_keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn empty_plate_offers_letters_and_digits() {
        let keyboard = plate_keyboard(Route::RegisterCar, "").unwrap();
        let rows = labels(&keyboard);

        assert_eq!(rows[0], vec!["A", "B", "C", "E"]);
        assert_eq!(rows[3], vec!["7", "8", "9"]);
        assert_eq!(rows[6], vec!["0"]);
        assert_eq!(rows.last().unwrap(), &vec!["⬅ Back"]);
    }

    #[test]
    fn only_valid_next_characters_are_offered() {
        let keyboard = plate_keyboard(Route::RegisterCar, "X").unwrap();

        assert!(keyboard.find("A").is_none());
        assert!(keyboard.find("7").is_some());
        assert!(keyboard.find("✅ Done").is_none());
    }

    #[test]
    fn complete_plate_offers_done_and_region_digit() {
        let keyboard = plate_keyboard(Route::Whois, "X703BX96").unwrap();

        let done = keyboard.find("✅ Done").unwrap();
        let callback = Callback::decode(done.callback_data.as_deref().unwrap()).unwrap();
        assert_eq!(callback, Callback::new("whois").arg("X703BX96").arg("OK"));
        assert!(keyboard.find("1").is_some());
        assert!(keyboard.find("A").is_none());
    }

    #[test]
    fn backspace_drops_the_last_character() {
        let keyboard = plate_keyboard(Route::RegisterCar, "X70").unwrap();

        let back = keyboard.find("⌫").unwrap();
        let callback = Callback::decode(back.callback_data.as_deref().unwrap()).unwrap();
        assert_eq!(callback.get(0), Some("X7"));
    }

    #[test]
    fn state_restarts_on_impossible_prefixes() {
        assert_eq!(state(&Callback::new("whois").arg("XX")), (String::new(), false));
        assert_eq!(
            state(&Callback::new("whois").arg("х703вх96").arg("OK")),
            ("X703BX96".to_owned(), true)
        );
        assert_eq!(
            state(&Callback::new("whois").arg("X703").arg("OK")),
            ("X703".to_owned(), false)
        );
    }
}
