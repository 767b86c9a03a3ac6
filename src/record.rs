//! Raw order documents as stored by the hosted document database, and their
//! normalization into [`Booking`]s. Records that cannot be placed on the
//! calendar are skipped, never surfaced as errors.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::*;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Older orders carry only a single delivery date.
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub pickup_slot: Option<String>,
    #[serde(default)]
    pub return_slot: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRecord {
    #[serde(default)]
    pub outfit_id: Option<String>,
    #[serde(default)]
    pub design_code: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub booked_sizes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingDates,
    UnparseableDate(String),
    EndBeforeStart,
}

impl SkipReason {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MissingDates => "missing_dates",
            SkipReason::UnparseableDate(_) => "unparseable_date",
            SkipReason::EndBeforeStart => "end_before_start",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingDates => write!(f, "no start, end or delivery date"),
            SkipReason::UnparseableDate(raw) => write!(f, "unparseable date: {raw:?}"),
            SkipReason::EndBeforeStart => write!(f, "end date before start date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBooking {
    pub id: String,
    pub reason: SkipReason,
}

/// Output of [`normalize_records`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub bookings: Vec<Booking>,
    pub skipped: Vec<SkippedBooking>,
}

/// Accepts `YYYY-MM-DD` (zero padding optional) or a timestamp whose date
/// part, before `T` or a space, is one. Empty and absent values both read as
/// "missing".
fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, SkipReason> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let head = raw.split_once(['T', ' ']).map_or(raw, |(date, _)| date);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| SkipReason::UnparseableDate(raw.to_string()))
}

fn non_empty(s: Option<&String>) -> Option<String> {
    s.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn normalize_items(items: &[LineItemRecord]) -> Vec<LineItem> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let outfit_id = non_empty(item.outfit_id.as_ref());
        let design_code = non_empty(item.design_code.as_ref());
        let mut sizes: Vec<String> = item
            .booked_sizes
            .iter()
            .filter_map(|s| non_empty(Some(s)))
            .collect();
        if let Some(size) = non_empty(item.size.as_ref())
            && !sizes.contains(&size)
        {
            sizes.push(size);
        }
        if sizes.is_empty() {
            out.push(LineItem {
                outfit_id,
                design_code,
                size: None,
            });
        } else {
            for size in sizes {
                out.push(LineItem {
                    outfit_id: outfit_id.clone(),
                    design_code: design_code.clone(),
                    size: Some(size),
                });
            }
        }
    }
    out
}

impl BookingRecord {
    /// Normalize one record. A start or end date alone stands for a single
    /// day, as does a bare delivery date.
    pub fn to_booking(&self) -> Result<Booking, SkipReason> {
        let start = parse_date(self.start_date.as_deref())?;
        let end = parse_date(self.end_date.as_deref())?;
        let delivery = parse_date(self.delivery_date.as_deref())?;

        let range = match (start, end, delivery) {
            (Some(s), Some(e), _) if e < s => return Err(SkipReason::EndBeforeStart),
            (Some(s), Some(e), _) => DateRange::new(s, e),
            (Some(day), None, _) | (None, Some(day), _) | (None, None, Some(day)) => {
                DateRange::single(day)
            }
            (None, None, None) => return Err(SkipReason::MissingDates),
        };

        let pickup_slot = self
            .pickup_slot
            .as_deref()
            .and_then(DayPart::parse)
            .unwrap_or(DayPart::DEFAULT_PICKUP);
        let return_slot = self
            .return_slot
            .as_deref()
            .and_then(DayPart::parse)
            .unwrap_or(DayPart::DEFAULT_RETURN);
        let status = self
            .status
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();

        Ok(Booking {
            id: self.id.clone(),
            range,
            pickup_slot,
            return_slot,
            status,
            items: normalize_items(&self.items),
        })
    }
}

/// Normalize a batch of records, setting aside the ones that cannot be
/// reasoned about.
pub fn normalize_records<'a>(records: impl IntoIterator<Item = &'a BookingRecord>) -> Normalized {
    let mut out = Normalized::default();
    for record in records {
        match record.to_booking() {
            Ok(booking) => out.bookings.push(booking),
            Err(reason) => {
                debug!(order = %record.id, %reason, "skipping booking");
                metrics::counter!(crate::observability::BOOKINGS_SKIPPED_TOTAL, "reason" => reason.label())
                    .increment(1);
                out.skipped.push(SkippedBooking {
                    id: record.id.clone(),
                    reason,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(id: &str) -> BookingRecord {
        BookingRecord {
            id: id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn parses_document_json() {
        let json = r#"{
            "id": "ord_1",
            "startDate": "2024-05-06T09:30:00.000Z",
            "endDate": "2024-05-08",
            "pickupSlot": "Afternoon",
            "returnSlot": "morning",
            "status": " Confirmed ",
            "items": [
                {"outfitId": "red-gown", "designCode": "RG-01", "size": "M"},
                {"designCode": "RG-01", "bookedSizes": ["S", "L"]}
            ]
        }"#;
        let rec: BookingRecord = serde_json::from_str(json).unwrap();
        let b = rec.to_booking().unwrap();
        assert_eq!(b.range, DateRange::new(d(2024, 5, 6), d(2024, 5, 8)));
        assert_eq!(b.pickup_slot, DayPart::Afternoon);
        assert_eq!(b.return_slot, DayPart::Morning);
        assert_eq!(b.status, "confirmed");
        let sizes: Vec<_> = b.items.iter().filter_map(|i| i.size.as_deref()).collect();
        assert_eq!(sizes, vec!["M", "S", "L"]);
        assert_eq!(b.items[1].outfit_id, None);
        assert_eq!(b.items[1].design_code.as_deref(), Some("RG-01"));
    }

    #[test]
    fn slot_defaults_when_absent_or_unknown() {
        let mut rec = record("o");
        rec.start_date = Some("2024-05-06".into());
        rec.end_date = Some("2024-05-06".into());
        rec.pickup_slot = Some("whenever".into());
        let b = rec.to_booking().unwrap();
        assert_eq!(b.pickup_slot, DayPart::Morning);
        assert_eq!(b.return_slot, DayPart::Afternoon);
    }

    #[test]
    fn delivery_date_stands_in_for_range() {
        let mut rec = record("legacy");
        rec.delivery_date = Some("2024-05-10".into());
        let b = rec.to_booking().unwrap();
        assert_eq!(b.range, DateRange::single(d(2024, 5, 10)));
    }

    #[test]
    fn single_sided_range_is_one_day() {
        let mut rec = record("half");
        rec.end_date = Some("2024-05-10".into());
        assert_eq!(rec.to_booking().unwrap().range, DateRange::single(d(2024, 5, 10)));
    }

    #[test]
    fn unpadded_and_timestamp_dates() {
        let mut rec = record("loose");
        rec.start_date = Some("2024-5-6".into());
        rec.end_date = Some("2024-05-8 14:00:00".into());
        assert_eq!(
            rec.to_booking().unwrap().range,
            DateRange::new(d(2024, 5, 6), d(2024, 5, 8))
        );

        rec.start_date = Some("2024-5-6T23:59:59+07:00".into());
        rec.end_date = None;
        assert_eq!(rec.to_booking().unwrap().range, DateRange::single(d(2024, 5, 6)));
    }

    #[test]
    fn skip_reasons() {
        assert_eq!(record("a").to_booking(), Err(SkipReason::MissingDates));

        let mut blank = record("b");
        blank.start_date = Some("   ".into());
        assert_eq!(blank.to_booking(), Err(SkipReason::MissingDates));

        let mut garbage = record("c");
        garbage.start_date = Some("next tuesday".into());
        assert!(matches!(garbage.to_booking(), Err(SkipReason::UnparseableDate(_))));

        let mut backwards = record("d");
        backwards.start_date = Some("2024-05-10".into());
        backwards.end_date = Some("2024-05-08".into());
        assert_eq!(backwards.to_booking(), Err(SkipReason::EndBeforeStart));
    }

    #[test]
    fn item_without_size_stays_sizeless() {
        let mut rec = record("o");
        rec.delivery_date = Some("2024-05-10".into());
        rec.items = vec![LineItemRecord {
            outfit_id: Some("red-gown".into()),
            size: Some("  ".into()),
            ..Default::default()
        }];
        let b = rec.to_booking().unwrap();
        assert_eq!(b.items.len(), 1);
        assert_eq!(b.items[0].size, None);
    }

    #[test]
    fn normalize_keeps_good_and_reports_bad() {
        let mut good = record("good");
        good.start_date = Some("2024-05-06".into());
        good.end_date = Some("2024-05-07".into());
        let bad = record("bad");

        let out = normalize_records([&good, &bad]);
        assert_eq!(out.bookings.len(), 1);
        assert_eq!(out.bookings[0].id, "good");
        assert_eq!(
            out.skipped,
            vec![SkippedBooking {
                id: "bad".into(),
                reason: SkipReason::MissingDates,
            }]
        );
    }
}
