//! House and apartment picker shared by the registration, resident lookup and
//! add-apartment wizards.
//!
//! The step is the argument list of the pressed button:
//! `[]` → `[house id]` → `[house id, range start]` → `[house id, range start, apartment]`
//! → `[house id, range start, apartment, "OK"]`. The house travels as its id so
//! the deepest payload stays bounded whatever the house is called.

use botcomod_house::House;

use super::{
    reply::{Button, Keyboard},
    route::Route,
};

pub const CONFIRM: &str = "OK";
const APARTMENTS_PER_ROW: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    ChooseHouse,
    ChooseRange {
        house: House,
    },
    ChooseApartment {
        house: House,
        start: i64,
        end: i64,
    },
    Confirm {
        house: House,
        start: i64,
        apartment: i64,
    },
    Confirmed {
        house: House,
        apartment: i64,
    },
}

/// Rebuilds the step from button arguments. `None` when the arguments do not
/// describe a reachable step, e.g. a house that no longer exists.
pub fn parse(args: &[String], houses: &[House]) -> Option<Step> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let (id, rest) = match args.as_slice() {
        [] | [""] => return Some(Step::ChooseHouse),
        [id, rest @ ..] => (*id, rest),
    };

    let id: i64 = id.parse().ok()?;
    let house = houses.iter().find(|house| house.id == id)?.clone();
    let Some((start, rest)) = rest.split_first() else {
        return Some(Step::ChooseRange { house });
    };

    let start: i64 = start.parse().ok()?;
    let (start, end) = house.rooms.page(start)?;
    let Some((apartment, rest)) = rest.split_first() else {
        return Some(Step::ChooseApartment { house, start, end });
    };

    let apartment: i64 = apartment.parse().ok()?;
    if !(start..=end).contains(&apartment) {
        return None;
    }

    match rest {
        [] => Some(Step::Confirm {
            house,
            start,
            apartment,
        }),
        [CONFIRM] => Some(Step::Confirmed { house, apartment }),
        _ => None,
    }
}

pub fn back_button() -> botcomod_shared::Result<Button> {
    Button::callback("⬅ Back", &Route::Menu.callback())
}

pub fn prompt(step: &Step) -> String {
    match step {
        Step::ChooseHouse => "Choose the house number".to_owned(),
        Step::ChooseRange { house } | Step::ChooseApartment { house, .. } => {
            format!("🏠 House {}. Choose the apartment number", house.number)
        }
        Step::Confirm {
            house, apartment, ..
        }
        | Step::Confirmed { house, apartment } => format!(
            "Let's check that everything is right.\n🏠 House {}\n🚪 Apartment {}\nIs that correct?",
            house.number, apartment
        ),
    }
}

/// Buttons for the next step. Every button carries the choices made so far.
pub fn keyboard(route: Route, step: &Step, houses: &[House]) -> botcomod_shared::Result<Keyboard> {
    let mut keyboard = Keyboard::new();

    match step {
        Step::ChooseHouse => {
            for house in houses {
                keyboard = keyboard.row(vec![Button::callback(
                    &house.number,
                    &route.callback().arg(house.id),
                )?]);
            }
        }
        Step::ChooseRange { house } => {
            for (start, end) in house.rooms.pages() {
                keyboard = keyboard.row(vec![Button::callback(
                    format!("{start} - {end}"),
                    &route.callback().arg(house.id).arg(start),
                )?]);
            }
        }
        Step::ChooseApartment { house, start, end } => {
            let buttons = (*start..=*end)
                .map(|apartment| {
                    Button::callback(
                        apartment.to_string(),
                        &route
                            .callback()
                            .arg(house.id)
                            .arg(start)
                            .arg(apartment),
                    )
                })
                .collect::<botcomod_shared::Result<Vec<_>>>()?;

            for row in buttons.chunks(APARTMENTS_PER_ROW) {
                keyboard = keyboard.row(row.to_vec());
            }
        }
        Step::Confirm {
            house,
            start,
            apartment,
        } => {
            keyboard = keyboard
                .row(vec![Button::callback(
                    "✅ Yes, that's right",
                    &route
                        .callback()
                        .arg(house.id)
                        .arg(start)
                        .arg(apartment)
                        .arg(CONFIRM),
                )?])
                .row(vec![Button::callback(
                    "❌ Wrong apartment",
                    &route.callback().arg(house.id),
                )?])
                .row(vec![Button::callback(
                    "❌ Wrong house",
                    &route.callback(),
                )?]);
        }
        Step::Confirmed { .. } => {}
    }

    Ok(keyboard.row(vec![back_button()?]))
}
