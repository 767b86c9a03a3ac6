use std::collections::{BTreeMap, BTreeSet};

use crate::model::*;

use super::calendar::{classify, SlotState};
use super::filter::booked_sizes;
use super::slots::{expand_slots_within, occupied_range};

/// Per-size, per-slot usage of one outfit over a fixed window of slots.
///
/// Built once from a booking snapshot; both the availability verdict and the
/// calendar colouring read from it.
#[derive(Debug)]
pub struct Occupancy<'a> {
    bookings: &'a [Booking],
    window: BTreeSet<Slot>,
    /// Tracked sizes and their stock, in outfit order.
    stock: Vec<(String, u32)>,
    /// size → slot → indices into `bookings`.
    usage: BTreeMap<String, BTreeMap<Slot, Vec<usize>>>,
}

/// Inputs shared by every occupancy build.
#[derive(Debug, Clone, Copy)]
pub struct OccupancyScope<'s> {
    pub outfit: &'s Outfit,
    pub sizes: &'s [String],
    /// Calendar days spanned by the window; bookings outside it are skipped
    /// before expansion.
    pub window_range: DateRange,
    pub buffer_days: u32,
    pub exclude_booking: Option<&'s str>,
}

impl<'a> Occupancy<'a> {
    pub fn build(bookings: &'a [Booking], window: BTreeSet<Slot>, scope: OccupancyScope<'_>) -> Self {
        let stock = scope
            .sizes
            .iter()
            .map(|size| {
                let qty = scope.outfit.stock_for(size).unwrap_or(DEFAULT_STOCK);
                (size.clone(), qty)
            })
            .collect();

        let mut usage: BTreeMap<String, BTreeMap<Slot, Vec<usize>>> = BTreeMap::new();

        for (idx, booking) in bookings.iter().enumerate() {
            if booking.is_cancelled() || scope.exclude_booking == Some(booking.id.as_str()) {
                continue;
            }
            let Some(held) = booked_sizes(booking, scope.outfit) else {
                continue;
            };
            if !occupied_range(booking, scope.buffer_days).overlaps(&scope.window_range) {
                continue;
            }
            let held_tracked: Vec<&String> = scope.sizes.iter().filter(|s| held.covers(s)).collect();
            if held_tracked.is_empty() {
                continue;
            }

            let slots = expand_slots_within(
                &booking.range,
                booking.pickup_slot,
                booking.return_slot,
                scope.buffer_days,
                &scope.window_range,
            );
            for slot in slots.intersection(&window) {
                for size in &held_tracked {
                    usage
                        .entry((*size).clone())
                        .or_default()
                        .entry(*slot)
                        .or_default()
                        .push(idx);
                }
            }
        }

        Self {
            bookings,
            window,
            stock,
            usage,
        }
    }

    pub fn window(&self) -> &BTreeSet<Slot> {
        &self.window
    }

    pub fn stock(&self, size: &str) -> u32 {
        self.stock
            .iter()
            .find(|(s, _)| s == size)
            .map_or(DEFAULT_STOCK, |(_, qty)| *qty)
    }

    pub fn count(&self, size: &str, slot: &Slot) -> u32 {
        self.usage
            .get(size)
            .and_then(|slots| slots.get(slot))
            .map_or(0, |ids| ids.len() as u32)
    }

    pub fn contributors(&self, size: &str, slot: &Slot) -> impl Iterator<Item = &'a Booking> + '_ {
        let bookings = self.bookings;
        self.usage
            .get(size)
            .and_then(|slots| slots.get(slot))
            .into_iter()
            .flatten()
            .map(move |&idx| &bookings[idx])
    }

    /// Highest concurrent usage of `size` in the window, and the earliest slot
    /// reaching it. `(0, None)` when nothing is booked.
    pub fn peak(&self, size: &str) -> (u32, Option<Slot>) {
        let mut best: (u32, Option<Slot>) = (0, None);
        if let Some(slots) = self.usage.get(size) {
            for (slot, ids) in slots {
                let n = ids.len() as u32;
                if n > best.0 {
                    best = (n, Some(*slot));
                }
            }
        }
        best
    }

    /// Window slots where `size` has no unit left, in order.
    pub fn saturated(&self, size: &str) -> Vec<Slot> {
        let stock = self.stock(size);
        self.window
            .iter()
            .filter(|slot| self.count(size, slot) >= stock)
            .copied()
            .collect()
    }

    /// Four-state colouring of one slot across all tracked sizes.
    pub fn state_at(&self, slot: &Slot) -> SlotState {
        classify(
            self.stock
                .iter()
                .map(|(size, qty)| (self.count(size, slot), *qty)),
        )
    }
}
