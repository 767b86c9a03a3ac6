use std::collections::BTreeSet;

use crate::limits::*;
use crate::model::*;

use super::AvailabilityError;

/// Sizes a matching booking holds. Legacy orders with no recorded size hold
/// every size the outfit offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BookedSizes<'b> {
    All,
    Listed(BTreeSet<&'b str>),
}

impl BookedSizes<'_> {
    pub(crate) fn covers(&self, size: &str) -> bool {
        match self {
            BookedSizes::All => true,
            BookedSizes::Listed(sizes) => sizes.contains(size),
        }
    }
}

/// Line items name outfits by id or by design code; either may match either.
pub fn matches_outfit(item: &LineItem, outfit: &Outfit) -> bool {
    let keys = [Some(outfit.id.as_str()), outfit.design_code.as_deref()];
    [item.outfit_id.as_deref(), item.design_code.as_deref()]
        .into_iter()
        .flatten()
        .any(|candidate| keys.contains(&Some(candidate)))
}

/// `None` when the booking holds nothing of `outfit`.
pub(crate) fn booked_sizes<'b>(booking: &'b Booking, outfit: &Outfit) -> Option<BookedSizes<'b>> {
    let mut matched = false;
    let mut sizes = BTreeSet::new();
    for item in booking.items.iter().filter(|i| matches_outfit(i, outfit)) {
        matched = true;
        if let Some(size) = item.size.as_deref() {
            sizes.insert(size);
        }
    }
    match (matched, sizes.is_empty()) {
        (false, _) => None,
        (true, true) => Some(BookedSizes::All),
        (true, false) => Some(BookedSizes::Listed(sizes)),
    }
}

pub(crate) fn validate_range(range: &DateRange) -> Result<(), AvailabilityError> {
    if range.end < range.start {
        return Err(AvailabilityError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    if range.num_days() > MAX_QUERY_DAYS {
        return Err(AvailabilityError::LimitExceeded("date range too wide"));
    }
    Ok(())
}

pub(crate) fn validate_buffer(buffer_days: u32) -> Result<(), AvailabilityError> {
    if buffer_days > MAX_BUFFER_DAYS {
        return Err(AvailabilityError::LimitExceeded("buffer too long"));
    }
    Ok(())
}

/// The sizes a check tracks: the requested one, or all of the outfit's.
pub(crate) fn tracked_sizes(outfit: &Outfit, size: Option<&str>) -> Result<Vec<String>, AvailabilityError> {
    if outfit.sizes.is_empty() {
        return Err(AvailabilityError::NoSizes(outfit.id.clone()));
    }
    match size {
        Some(size) if !outfit.sizes.contains_key(size) => Err(AvailabilityError::UnknownSize {
            outfit: outfit.id.clone(),
            size: size.to_string(),
        }),
        Some(size) => Ok(vec![size.to_string()]),
        None => Ok(outfit.sizes.keys().cloned().collect()),
    }
}

/// Validate a request and resolve its tracked sizes.
pub(crate) fn validate_request(request: &AvailabilityRequest) -> Result<Vec<String>, AvailabilityError> {
    validate_range(&request.range)?;
    validate_buffer(request.buffer_days)?;
    tracked_sizes(&request.outfit, request.size.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn item(outfit_id: Option<&str>, design_code: Option<&str>, size: Option<&str>) -> LineItem {
        LineItem {
            outfit_id: outfit_id.map(Into::into),
            design_code: design_code.map(Into::into),
            size: size.map(Into::into),
        }
    }

    fn booking(items: Vec<LineItem>) -> Booking {
        Booking {
            id: "o1".into(),
            range: DateRange::single(d(6)),
            pickup_slot: DayPart::Morning,
            return_slot: DayPart::Afternoon,
            status: "confirmed".into(),
            items,
        }
    }

    #[test]
    fn id_and_design_code_both_match() {
        let outfit = Outfit::new("red-gown").with_design_code("RG-01");
        assert!(matches_outfit(&item(Some("red-gown"), None, None), &outfit));
        assert!(matches_outfit(&item(None, Some("RG-01"), None), &outfit));
        // Some documents store the design code in the id field.
        assert!(matches_outfit(&item(Some("RG-01"), None, None), &outfit));
        assert!(!matches_outfit(&item(Some("blue-suit"), Some("BS-02"), None), &outfit));
        assert!(!matches_outfit(&item(None, None, Some("M")), &outfit));
    }

    #[test]
    fn booked_sizes_listed_all_or_none() {
        let outfit = Outfit::new("red-gown");
        let b = booking(vec![
            item(Some("red-gown"), None, Some("M")),
            item(Some("red-gown"), None, Some("M")),
            item(Some("other"), None, Some("S")),
        ]);
        let sizes = booked_sizes(&b, &outfit).unwrap();
        assert!(sizes.covers("M"));
        assert!(!sizes.covers("S"));

        let legacy = booking(vec![item(Some("red-gown"), None, None)]);
        assert_eq!(booked_sizes(&legacy, &outfit), Some(BookedSizes::All));

        let unrelated = booking(vec![item(Some("other"), None, Some("M"))]);
        assert_eq!(booked_sizes(&unrelated, &outfit), None);
    }

    #[test]
    fn range_validation() {
        let backwards = DateRange { start: d(8), end: d(6) };
        assert_eq!(
            validate_range(&backwards),
            Err(AvailabilityError::InvalidRange { start: d(8), end: d(6) })
        );
        assert!(validate_range(&DateRange::single(d(6))).is_ok());

        let wide = DateRange {
            start: d(1),
            end: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        };
        assert_eq!(
            validate_range(&wide),
            Err(AvailabilityError::LimitExceeded("date range too wide"))
        );
    }

    #[test]
    fn buffer_validation() {
        assert!(validate_buffer(MAX_BUFFER_DAYS).is_ok());
        assert!(validate_buffer(MAX_BUFFER_DAYS + 1).is_err());
    }

    #[test]
    fn size_resolution() {
        let empty = Outfit::new("bare");
        assert_eq!(
            tracked_sizes(&empty, None),
            Err(AvailabilityError::NoSizes("bare".into()))
        );

        let outfit = Outfit::new("red-gown").with_size("S", None).with_size("M", Some(2));
        assert_eq!(tracked_sizes(&outfit, None).unwrap(), vec!["M", "S"]);
        assert_eq!(tracked_sizes(&outfit, Some("S")).unwrap(), vec!["S"]);
        let err = tracked_sizes(&outfit, Some("XL")).unwrap_err();
        assert!(err.is_configuration());
    }
}
