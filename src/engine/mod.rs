//! Rental availability engine.
//!
//! Pure and synchronous: every call takes its own booking snapshot and
//! returns a fresh verdict, so calls can run concurrently without sharing
//! state. A verdict only describes the snapshot it was given.

mod availability;
mod calendar;
mod error;
mod filter;
mod occupancy;
mod slots;

pub use availability::{check_availability, classify_blockage, merge_runs};
pub use calendar::{classify, day_grid, month_grid, DayCell, SlotState};
pub use error::AvailabilityError;
pub use filter::matches_outfit;
pub use occupancy::{Occupancy, OccupancyScope};
pub use slots::{expand_slots, expand_slots_within, occupied_range};
