use chrono::NaiveDate;

/// Hard failures of a check. None of these mean "unavailable"; they are
/// input problems the caller must surface as validation messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// Same-day rental picked up in the afternoon and returned that morning.
    EmptyWindow(NaiveDate),
    InvalidMonth { year: i32, month: u32 },
    NoSizes(String),
    UnknownSize { outfit: String, size: String },
    UnknownOutfit(String),
    StudioNotFound(String),
    InvalidStudio(&'static str),
    LimitExceeded(&'static str),
}

impl AvailabilityError {
    /// The outfit or catalog is set up in a way no check can answer.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AvailabilityError::NoSizes(_)
                | AvailabilityError::UnknownSize { .. }
                | AvailabilityError::UnknownOutfit(_)
        )
    }

    /// The request itself is malformed.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AvailabilityError::InvalidRange { .. }
                | AvailabilityError::EmptyWindow(_)
                | AvailabilityError::InvalidMonth { .. }
                | AvailabilityError::InvalidStudio(_)
                | AvailabilityError::LimitExceeded(_)
        )
    }
}

impl std::fmt::Display for AvailabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityError::InvalidRange { start, end } => {
                write!(f, "invalid range: end {end} is before start {start}")
            }
            AvailabilityError::EmptyWindow(date) => {
                write!(f, "empty rental window: afternoon pickup and morning return on {date}")
            }
            AvailabilityError::InvalidMonth { year, month } => {
                write!(f, "invalid month: {year}-{month:02}")
            }
            AvailabilityError::NoSizes(outfit) => write!(f, "no sizes defined for outfit {outfit}"),
            AvailabilityError::UnknownSize { outfit, size } => {
                write!(f, "outfit {outfit} has no size {size:?}")
            }
            AvailabilityError::UnknownOutfit(key) => write!(f, "outfit not found: {key}"),
            AvailabilityError::StudioNotFound(name) => write!(f, "studio not loaded: {name}"),
            AvailabilityError::InvalidStudio(msg) => write!(f, "invalid studio: {msg}"),
            AvailabilityError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for AvailabilityError {}
