//! Grammar of Russian license plates, used to drive the plate keyboard.

use std::ops::{BitOr, BitOrAssign};

pub const LETTERS: &str = "ABCEHKMOPTXY";
pub const DIGITS: &str = "0123456789";

/// Set of character classes that may come next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Next(u8);

impl Next {
    pub const NONE: Next = Next(0);
    pub const DIGIT: Next = Next(1);
    pub const LETTER: Next = Next(2);
    /// The plate is already complete.
    pub const END: Next = Next(4);

    pub fn contains(self, other: Next) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for Next {
    type Output = Next;

    fn bitor(self, rhs: Next) -> Next {
        Next(self.0 | rhs.0)
    }
}

impl BitOrAssign for Next {
    fn bitor_assign(&mut self, rhs: Next) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Digit,
    Letter,
}

use Slot::{Digit as N, Letter as L};

const TEMPLATES: [&[Slot]; 4] = [
    // automobile
    &[L, N, N, N, L, L, N, N],
    &[L, N, N, N, L, L, N, N, N],
    // motorcycle
    &[N, N, N, N, L, L, N, N],
    &[N, N, N, N, L, L, N, N, N],
];

fn classify(c: char) -> Option<Slot> {
    if DIGITS.contains(c) {
        Some(Slot::Digit)
    } else if LETTERS.contains(c) {
        Some(Slot::Letter)
    } else {
        None
    }
}

fn matches_prefix(template: &[Slot], plate: &[Slot]) -> bool {
    plate.len() <= template.len() && template.iter().zip(plate).all(|(a, b)| a == b)
}

fn slots(plate: &str) -> Option<Vec<Slot>> {
    plate.chars().map(classify).collect()
}

/// What may follow `plate`. [`Next::NONE`] means `plate` is not a prefix of any template.
pub fn next_character(plate: &str) -> Next {
    let Some(slots) = slots(plate) else {
        return Next::NONE;
    };

    let mut next = Next::NONE;
    for template in TEMPLATES {
        if !matches_prefix(template, &slots) {
            continue;
        }

        next |= match template.get(slots.len()) {
            Some(Slot::Digit) => Next::DIGIT,
            Some(Slot::Letter) => Next::LETTER,
            None => Next::END,
        };
    }

    next
}

pub fn is_complete(plate: &str) -> bool {
    next_character(plate).contains(Next::END)
}

/// Uppercases and maps Cyrillic look-alikes to the Latin letters used on plates.
pub fn normalize(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'А' => 'A',
            'В' => 'B',
            'С' => 'C',
            'Е' => 'E',
            'Н' => 'H',
            'К' => 'K',
            'М' => 'M',
            'О' => 'O',
            'Р' => 'P',
            'Т' => 'T',
            'Х' => 'X',
            'У' => 'Y',
            c => c,
        })
        .collect()
}

pub fn hint(plate: &str) -> &'static str {
    match plate.chars().count() {
        0 => "Enter the first character: a letter for a car, a digit for a motorcycle",
        1..=5 => "Enter the plate number",
        6..=7 => "Enter the region code",
        _ => "The plate is complete, confirm it or add a third region digit",
    }
}
