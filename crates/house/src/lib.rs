mod repository;
mod service;

pub use repository::*;
pub use service::Houses;

use serde::Serialize;
use validator::{Validate, ValidationError};

/// Number of apartments shown on one page of the apartment picker.
pub const RANGE_SIZE: i64 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct House {
    pub id: i64,
    pub number: String,
    pub construction: Option<String>,
    pub rooms: RoomRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Validate)]
#[validate(schema(function = "validate_order"))]
pub struct RoomRange {
    #[validate(range(min = 1, max = 9999, message = "apartments are numbered 1 to 9999"))]
    pub min: i64,
    #[validate(range(min = 1, max = 9999, message = "apartments are numbered 1 to 9999"))]
    pub max: i64,
}

fn validate_order(rooms: &RoomRange) -> Result<(), ValidationError> {
    if rooms.min > rooms.max {
        return Err(ValidationError::new("order").with_message(
            format!("invalid apartment range {}..{}", rooms.min, rooms.max).into(),
        ));
    }

    Ok(())
}

impl RoomRange {
    fn page_end(&self, start: i64) -> i64 {
        start.saturating_add(RANGE_SIZE - 1).min(self.max)
    }

    /// Splits the range into `[start, end]` pages of at most [`RANGE_SIZE`] apartments.
    pub fn pages(&self) -> Vec<(i64, i64)> {
        let mut pages = vec![];
        let mut start = self.min;
        while start <= self.max {
            let end = self.page_end(start);
            pages.push((start, end));
            if end == self.max {
                break;
            }
            start = end + 1;
        }

        pages
    }

    /// The page that starts at `start`, if `start` is a valid page start.
    pub fn page(&self, start: i64) -> Option<(i64, i64)> {
        let offset = start.checked_sub(self.min)?;
        if offset < 0 || start > self.max || offset % RANGE_SIZE != 0 {
            return None;
        }

        Some((start, self.page_end(start)))
    }
}
