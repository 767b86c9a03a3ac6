use crate::model::CheckMode;

// ── Request-driven metrics ──────────────────────────────────────

/// Counter: availability checks run. Labels: mode, verdict.
pub const CHECKS_TOTAL: &str = "rentcal_checks_total";

/// Histogram: check latency in seconds. Labels: mode.
pub const CHECK_DURATION_SECONDS: &str = "rentcal_check_duration_seconds";

/// Counter: calendar grids computed.
pub const CALENDAR_GRIDS_TOTAL: &str = "rentcal_calendar_grids_total";

// ── Data quality ────────────────────────────────────────────────

/// Counter: order records left out of a snapshot. Labels: reason.
pub const BOOKINGS_SKIPPED_TOTAL: &str = "rentcal_bookings_skipped_total";

/// Gauge: studios with a loaded snapshot.
pub const STUDIOS_ACTIVE: &str = "rentcal_studios_active";

/// The library only emits through the `metrics` facade; installing a
/// recorder/exporter is up to the host process.
pub fn mode_label(mode: CheckMode) -> &'static str {
    match mode {
        CheckMode::SingleSize => "single_size",
        CheckMode::AnySize => "any_size",
    }
}

pub fn verdict_label(available: bool) -> &'static str {
    if available { "available" } else { "unavailable" }
}
