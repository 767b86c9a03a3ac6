use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::*;
use crate::observability::CALENDAR_GRIDS_TOTAL;

use super::filter::{tracked_sizes, validate_buffer, validate_range};
use super::occupancy::{Occupancy, OccupancyScope};
use super::slots::expand_slots;
use super::AvailabilityError;

/// Calendar colouring of one half-day, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// Nothing booked.
    Free,
    /// Booked, every tracked size still has a unit.
    Booked,
    /// Some tracked sizes exhausted.
    Warning,
    /// Every tracked size exhausted.
    SoldOut,
}

impl SlotState {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotState::Free => "free",
            SlotState::Booked => "booked",
            SlotState::Warning => "warning",
            SlotState::SoldOut => "sold_out",
        }
    }
}

/// Classify one slot from `(used, stock)` per tracked size.
pub fn classify(usage: impl IntoIterator<Item = (u32, u32)>) -> SlotState {
    let mut tracked = 0usize;
    let mut exhausted = 0usize;
    let mut in_use = false;
    for (used, stock) in usage {
        tracked += 1;
        in_use |= used > 0;
        if used >= stock {
            exhausted += 1;
        }
    }
    if tracked == 0 {
        SlotState::Free
    } else if exhausted == tracked {
        SlotState::SoldOut
    } else if exhausted > 0 {
        SlotState::Warning
    } else if in_use {
        SlotState::Booked
    } else {
        SlotState::Free
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub am: SlotState,
    pub pm: SlotState,
}

impl DayCell {
    /// The worse of the two halves.
    pub fn state(&self) -> SlotState {
        self.am.max(self.pm)
    }
}

/// Colour every half-day of `range` for `outfit`, restricted to `size` if given.
pub fn day_grid(
    bookings: &[Booking],
    outfit: &Outfit,
    size: Option<&str>,
    range: DateRange,
    buffer_days: u32,
) -> Result<Vec<DayCell>, AvailabilityError> {
    validate_range(&range)?;
    validate_buffer(buffer_days)?;
    let sizes = tracked_sizes(outfit, size)?;

    let window = expand_slots(&range, DayPart::Morning, DayPart::Afternoon, 0);
    let occupancy = Occupancy::build(
        bookings,
        window,
        OccupancyScope {
            outfit,
            sizes: &sizes,
            window_range: range,
            buffer_days,
            exclude_booking: None,
        },
    );

    Ok(range
        .days()
        .map(|date| DayCell {
            date,
            am: occupancy.state_at(&Slot::am(date)),
            pm: occupancy.state_at(&Slot::pm(date)),
        })
        .collect())
}

/// [`day_grid`] over one calendar month.
pub fn month_grid(
    bookings: &[Booking],
    outfit: &Outfit,
    size: Option<&str>,
    year: i32,
    month: u32,
    buffer_days: u32,
) -> Result<Vec<DayCell>, AvailabilityError> {
    let invalid = || AvailabilityError::InvalidMonth { year, month };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;

    let grid = day_grid(bookings, outfit, size, DateRange::new(first, last), buffer_days)?;
    debug!(outfit = %outfit.id, year, month, "calendar grid computed");
    metrics::counter!(CALENDAR_GRIDS_TOTAL).increment(1);
    Ok(grid)
}
