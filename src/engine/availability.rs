use std::time::Instant;

use chrono::NaiveDate;
use tracing::debug;

use crate::model::*;
use crate::observability::{mode_label, verdict_label, CHECKS_TOTAL, CHECK_DURATION_SECONDS};

use super::filter::validate_request;
use super::occupancy::{Occupancy, OccupancyScope};
use super::slots::expand_slots;
use super::AvailabilityError;

// ── Availability check ────────────────────────────────────────────

/// Decide whether `request` fits alongside `bookings`.
///
/// Single-size mode needs the requested size to keep a free unit in every
/// slot of the rental window. Any-size mode is satisfied by any one tracked
/// size doing so. Existing bookings are expanded with `request.buffer_days`;
/// the request's own window is not.
pub fn check_availability(
    bookings: &[Booking],
    request: &AvailabilityRequest,
) -> Result<AvailabilityResult, AvailabilityError> {
    let started = Instant::now();
    let tracked = validate_request(request)?;
    let mode = request.mode();

    let window = expand_slots(&request.range, request.pickup_slot, request.return_slot, 0);
    if window.is_empty() {
        return Err(AvailabilityError::EmptyWindow(request.range.start));
    }
    let occupancy = Occupancy::build(
        bookings,
        window,
        OccupancyScope {
            outfit: &request.outfit,
            sizes: &tracked,
            window_range: request.range,
            buffer_days: request.buffer_days,
            exclude_booking: request.exclude_booking.as_deref(),
        },
    );

    let sizes: Vec<SizeAvailability> = tracked
        .iter()
        .map(|size| size_availability(&occupancy, request, size))
        .collect();
    let result = verdict(mode, sizes);

    debug!(
        outfit = %request.outfit.id,
        start = %request.range.start,
        end = %request.range.end,
        available = result.available,
        peak = result.peak_usage,
        "availability check: {}",
        result.reason
    );
    metrics::counter!(CHECKS_TOTAL, "mode" => mode_label(mode), "verdict" => verdict_label(result.available))
        .increment(1);
    metrics::histogram!(CHECK_DURATION_SECONDS, "mode" => mode_label(mode))
        .record(started.elapsed().as_secs_f64());

    Ok(result)
}

fn size_availability(occupancy: &Occupancy<'_>, request: &AvailabilityRequest, size: &str) -> SizeAvailability {
    let total_stock = occupancy.stock(size);
    let (peak_usage, peak_slot) = occupancy.peak(size);
    let contributors = peak_slot
        .map(|slot| {
            occupancy
                .contributors(size, &slot)
                .map(|b| b.id.clone())
                .collect()
        })
        .unwrap_or_default();

    let saturated = occupancy.saturated(size);
    let blocked = saturated.first().map(|first| {
        let date = first.date;
        let am = saturated.contains(&Slot::am(date));
        let pm = saturated.contains(&Slot::pm(date));
        BlockedDay {
            date,
            size: size.to_string(),
            blockage: classify_blockage(request, date, am, pm),
        }
    });

    SizeAvailability {
        size: size.to_string(),
        total_stock,
        peak_usage,
        remaining: total_stock.saturating_sub(peak_usage),
        peak_slot,
        contributors,
        blocked,
        blocked_runs: merge_runs(&saturated),
    }
}

/// Name the way a blocked day stops the rental. Both halves taken is always
/// "fully booked". A single half on the first or last day is blamed on the
/// hand-over it collides with; inside the rental it is named by the half.
pub fn classify_blockage(request: &AvailabilityRequest, date: NaiveDate, am: bool, pm: bool) -> Blockage {
    let range = &request.range;
    match (am, pm) {
        (true, true) => Blockage::FullyBooked,
        _ if date == range.start && date == range.end => {
            if am || request.pickup_slot == DayPart::Afternoon {
                Blockage::PickupSlotOccupied
            } else {
                Blockage::ReturnSlotOccupied
            }
        }
        _ if date == range.start => Blockage::PickupSlotOccupied,
        _ if date == range.end => Blockage::ReturnSlotOccupied,
        (true, false) => Blockage::MorningOccupied,
        (false, true) => Blockage::AfternoonOccupied,
        (false, false) => Blockage::FullyBooked,
    }
}

fn verdict(mode: CheckMode, sizes: Vec<SizeAvailability>) -> AvailabilityResult {
    let available = sizes.iter().any(SizeAvailability::is_clear);

    // Headline size: the roomiest clear one, else the one blocked earliest.
    let mut headline: Option<&SizeAvailability> = None;
    for s in &sizes {
        let better = match headline {
            None => true,
            Some(h) if available => s.is_clear() && s.remaining > h.remaining,
            Some(h) => blocked_date(s) < blocked_date(h),
        };
        if better && (!available || s.is_clear()) {
            headline = Some(s);
        }
    }

    let Some(h) = headline.cloned() else {
        return AvailabilityResult {
            available,
            mode,
            size: None,
            remaining: 0,
            total_stock: 0,
            peak_usage: 0,
            contributors: Vec::new(),
            blocked: None,
            blocked_runs: Vec::new(),
            reason: "no sizes tracked".to_string(),
            sizes,
        };
    };

    AvailabilityResult {
        available,
        mode,
        reason: reason_for(mode, available, &h),
        size: Some(h.size),
        remaining: h.remaining,
        total_stock: h.total_stock,
        peak_usage: h.peak_usage,
        contributors: h.contributors,
        blocked: h.blocked,
        blocked_runs: h.blocked_runs,
        sizes,
    }
}

fn blocked_date(s: &SizeAvailability) -> NaiveDate {
    s.blocked.as_ref().map_or(NaiveDate::MAX, |b| b.date)
}

fn reason_for(mode: CheckMode, available: bool, h: &SizeAvailability) -> String {
    if available {
        let free = format!("{} of {} free", h.remaining, h.total_stock);
        return match mode {
            CheckMode::SingleSize => format!("size {} available ({free})", h.size),
            CheckMode::AnySize => format!("available in size {} ({free})", h.size),
        };
    }
    let detail = match &h.blocked {
        Some(b) => format!("size {}: {} on {}", h.size, b.blockage, b.date),
        None => format!("size {}: no stock", h.size),
    };
    match mode {
        CheckMode::SingleSize => detail,
        CheckMode::AnySize => format!("no size available; {detail}"),
    }
}

/// Merge sorted slots into runs of consecutive half-days.
pub fn merge_runs(sorted: &[Slot]) -> Vec<SlotRun> {
    let mut runs: Vec<SlotRun> = Vec::new();
    for &slot in sorted {
        if let Some(last) = runs.last_mut()
            && slot.ordinal() <= last.last.ordinal() + 1
        {
            if slot > last.last {
                last.last = slot;
            }
            continue;
        }
        runs.push(SlotRun {
            first: slot,
            last: slot,
        });
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn request(start: u32, end: u32, pickup: DayPart, ret: DayPart) -> AvailabilityRequest {
        let outfit = Outfit::new("gown").with_size("M", None);
        AvailabilityRequest::new(outfit, d(start), d(end)).slots(pickup, ret)
    }

    // ── merge_runs ────────────────────────────────────────

    #[test]
    fn merge_runs_basic() {
        let slots = vec![
            Slot::pm(d(6)),
            Slot::am(d(7)),
            Slot::pm(d(7)),
            Slot::pm(d(8)),
        ];
        let runs = merge_runs(&slots);
        assert_eq!(
            runs,
            vec![
                SlotRun { first: Slot::pm(d(6)), last: Slot::pm(d(7)) },
                SlotRun { first: Slot::pm(d(8)), last: Slot::pm(d(8)) },
            ]
        );
    }

    #[test]
    fn merge_runs_empty() {
        assert!(merge_runs(&[]).is_empty());
    }

    // ── classify_blockage ─────────────────────────────────

    #[test]
    fn both_halves_is_fully_booked() {
        let req = request(6, 8, DayPart::Morning, DayPart::Afternoon);
        assert_eq!(classify_blockage(&req, d(6), true, true), Blockage::FullyBooked);
        assert_eq!(classify_blockage(&req, d(8), true, true), Blockage::FullyBooked);
    }

    #[test]
    fn half_blocked_on_edges() {
        let req = request(6, 8, DayPart::Morning, DayPart::Afternoon);
        assert_eq!(classify_blockage(&req, d(6), true, false), Blockage::PickupSlotOccupied);
        assert_eq!(classify_blockage(&req, d(8), false, true), Blockage::ReturnSlotOccupied);
        assert_eq!(classify_blockage(&req, d(7), false, true), Blockage::AfternoonOccupied);
        assert_eq!(classify_blockage(&req, d(7), true, false), Blockage::MorningOccupied);
    }

    #[test]
    fn half_blocked_single_day() {
        let req = request(6, 6, DayPart::Morning, DayPart::Afternoon);
        assert_eq!(classify_blockage(&req, d(6), true, false), Blockage::PickupSlotOccupied);
        assert_eq!(classify_blockage(&req, d(6), false, true), Blockage::ReturnSlotOccupied);

        let afternoon = request(6, 6, DayPart::Afternoon, DayPart::Afternoon);
        assert_eq!(
            classify_blockage(&afternoon, d(6), false, true),
            Blockage::PickupSlotOccupied
        );
    }
}
