use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Units assumed for a size whose stock quantity was never recorded.
pub const DEFAULT_STOCK: u32 = 1;

/// Order statuses that release the outfit. Compared after trim + lowercase.
pub const CANCELLED_STATUSES: &[&str] = &[
    "cancelled",
    "canceled",
    "returned",
    "rejected",
    "failed",
    "returned_early",
    "returned_early_cancelled",
];

/// Half of a calendar day, the unit of occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HalfDay {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl HalfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            HalfDay::Am => "AM",
            HalfDay::Pm => "PM",
        }
    }
}

/// One half-day of one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub half: HalfDay,
}

impl Slot {
    pub fn am(date: NaiveDate) -> Self {
        Self {
            date,
            half: HalfDay::Am,
        }
    }

    pub fn pm(date: NaiveDate) -> Self {
        Self {
            date,
            half: HalfDay::Pm,
        }
    }

    /// Position on a half-day timeline; consecutive slots differ by exactly one.
    pub fn ordinal(&self) -> i64 {
        let half = match self.half {
            HalfDay::Am => 0,
            HalfDay::Pm => 1,
        };
        i64::from(self.date.num_days_from_ce()) * 2 + half
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.date, self.half.as_str())
    }
}

/// When in the day an outfit changes hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    Morning,
    Afternoon,
}

impl DayPart {
    pub const DEFAULT_PICKUP: DayPart = DayPart::Morning;
    pub const DEFAULT_RETURN: DayPart = DayPart::Afternoon;

    /// Lenient parse of the free-text slot values found in order documents.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" | "am" => Some(DayPart::Morning),
            "afternoon" | "pm" | "evening" => Some(DayPart::Afternoon),
            _ => None,
        }
    }

    pub fn default_pickup() -> Self {
        Self::DEFAULT_PICKUP
    }

    pub fn default_return() -> Self {
        Self::DEFAULT_RETURN
    }
}

/// Inclusive calendar-date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "DateRange start must not be after end");
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Number of calendar days covered, counting both ends.
    pub fn num_days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Days covered by both ranges, if any.
    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange { start, end })
    }

    /// The range pushed out by `days` trailing days (saturating at the calendar's end).
    pub fn extend_end(&self, days: u32) -> Self {
        let end = self
            .end
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        Self {
            start: self.start,
            end,
        }
    }
}

/// One rented piece on an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub outfit_id: Option<String>,
    pub design_code: Option<String>,
    /// `None` on legacy orders that never recorded a size.
    pub size: Option<String>,
}

/// An existing order as the engine sees it. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub range: DateRange,
    pub pickup_slot: DayPart,
    pub return_slot: DayPart,
    /// Lower-cased free text.
    pub status: String,
    pub items: Vec<LineItem>,
}

impl Booking {
    pub fn is_cancelled(&self) -> bool {
        CANCELLED_STATUSES.contains(&self.status.as_str())
    }
}

/// An outfit and its per-size stock. A `None` quantity means "not recorded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub id: String,
    #[serde(default)]
    pub design_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sizes: BTreeMap<String, Option<u32>>,
}

impl Outfit {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: impl Into<String>, quantity: Option<u32>) -> Self {
        self.sizes.insert(size.into(), quantity);
        self
    }

    pub fn with_design_code(mut self, code: impl Into<String>) -> Self {
        self.design_code = Some(code.into());
        self
    }

    /// Units of `size` on hand. `None` if the outfit does not offer that size.
    pub fn stock_for(&self, size: &str) -> Option<u32> {
        self.sizes
            .get(size)
            .map(|qty| qty.unwrap_or(DEFAULT_STOCK))
    }
}

/// Whether a check pins one size or accepts any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    SingleSize,
    AnySize,
}

/// A prospective rental to test against the existing bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRequest {
    pub outfit: Outfit,
    /// `None` checks every size the outfit offers.
    pub size: Option<String>,
    pub range: DateRange,
    pub pickup_slot: DayPart,
    pub return_slot: DayPart,
    /// Full days blocked after each existing booking's return date.
    pub buffer_days: u32,
    /// Order being edited; its own record must not block it.
    pub exclude_booking: Option<String>,
}

impl AvailabilityRequest {
    pub fn new(outfit: Outfit, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            outfit,
            size: None,
            range: DateRange { start, end },
            pickup_slot: DayPart::DEFAULT_PICKUP,
            return_slot: DayPart::DEFAULT_RETURN,
            buffer_days: 0,
            exclude_booking: None,
        }
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn slots(mut self, pickup: DayPart, ret: DayPart) -> Self {
        self.pickup_slot = pickup;
        self.return_slot = ret;
        self
    }

    pub fn buffer_days(mut self, days: u32) -> Self {
        self.buffer_days = days;
        self
    }

    pub fn excluding(mut self, booking_id: impl Into<String>) -> Self {
        self.exclude_booking = Some(booking_id.into());
        self
    }

    pub fn mode(&self) -> CheckMode {
        if self.size.is_some() {
            CheckMode::SingleSize
        } else {
            CheckMode::AnySize
        }
    }
}

/// Why a particular day stops a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blockage {
    PickupSlotOccupied,
    ReturnSlotOccupied,
    /// Only the morning of a day strictly inside the rental.
    MorningOccupied,
    /// Only the afternoon of a day strictly inside the rental.
    AfternoonOccupied,
    FullyBooked,
}

impl fmt::Display for Blockage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blockage::PickupSlotOccupied => write!(f, "pickup slot occupied"),
            Blockage::ReturnSlotOccupied => write!(f, "return slot occupied"),
            Blockage::MorningOccupied => write!(f, "morning occupied"),
            Blockage::AfternoonOccupied => write!(f, "afternoon occupied"),
            Blockage::FullyBooked => write!(f, "fully booked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedDay {
    pub date: NaiveDate,
    pub size: String,
    pub blockage: Blockage,
}

/// Contiguous run of saturated slots, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotRun {
    pub first: Slot,
    pub last: Slot,
}

/// Occupancy summary for one size across the query window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeAvailability {
    pub size: String,
    pub total_stock: u32,
    pub peak_usage: u32,
    pub remaining: u32,
    pub peak_slot: Option<Slot>,
    /// Booking ids occupying `peak_slot`.
    pub contributors: Vec<String>,
    pub blocked: Option<BlockedDay>,
    pub blocked_runs: Vec<SlotRun>,
}

impl SizeAvailability {
    pub fn is_clear(&self) -> bool {
        self.remaining > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityResult {
    pub available: bool,
    pub mode: CheckMode,
    /// The size the headline numbers describe.
    pub size: Option<String>,
    pub remaining: u32,
    pub total_stock: u32,
    pub peak_usage: u32,
    pub contributors: Vec<String>,
    pub blocked: Option<BlockedDay>,
    pub blocked_runs: Vec<SlotRun>,
    pub reason: String,
    pub sizes: Vec<SizeAvailability>,
}
