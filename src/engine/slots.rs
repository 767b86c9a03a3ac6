use std::collections::BTreeSet;

use crate::model::*;

/// Expand a rental window into the half-day slots it occupies.
///
/// - single day: AM if picked up in the morning, PM if returned in the afternoon
/// - first day: PM always, AM only for a morning pickup
/// - last day: AM always, PM only for an afternoon return
/// - days in between: both halves
///
/// `buffer_days` whole days after `range.end` are appended regardless of the
/// return slot.
pub fn expand_slots(
    range: &DateRange,
    pickup: DayPart,
    ret: DayPart,
    buffer_days: u32,
) -> BTreeSet<Slot> {
    expand_slots_within(range, pickup, ret, buffer_days, &range.extend_end(buffer_days))
}

/// [`expand_slots`] restricted to the days of `within`. Only the clipped days
/// are visited, so the cost follows `within` rather than the booking's length.
pub fn expand_slots_within(
    range: &DateRange,
    pickup: DayPart,
    ret: DayPart,
    buffer_days: u32,
    within: &DateRange,
) -> BTreeSet<Slot> {
    let mut slots = BTreeSet::new();
    let Some(clip) = range.extend_end(buffer_days).intersection(within) else {
        return slots;
    };
    let morning_pickup = pickup == DayPart::Morning;
    let afternoon_return = ret == DayPart::Afternoon;

    for date in clip.days() {
        let (am, pm) = if date > range.end {
            (true, true)
        } else {
            match (date == range.start, date == range.end) {
                (true, true) => (morning_pickup, afternoon_return),
                (true, false) => (morning_pickup, true),
                (false, true) => (true, afternoon_return),
                (false, false) => (true, true),
            }
        };
        if am {
            slots.insert(Slot::am(date));
        }
        if pm {
            slots.insert(Slot::pm(date));
        }
    }

    slots
}

/// Calendar days a booking keeps the outfit out of circulation, buffer included.
pub fn occupied_range(booking: &Booking, buffer_days: u32) -> DateRange {
    booking.range.extend_end(buffer_days)
}
