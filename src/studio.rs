use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::info;

use crate::config::Policy;
use crate::engine::{check_availability, month_grid, AvailabilityError, DayCell};
use crate::limits::*;
use crate::model::*;
use crate::record::{normalize_records, BookingRecord, SkippedBooking};

/// Immutable view of one studio's orders and catalog.
#[derive(Debug, Default)]
pub struct StudioSnapshot {
    pub bookings: Vec<Booking>,
    pub skipped: Vec<SkippedBooking>,
    outfits: Vec<Outfit>,
    /// Outfit id and design code → index into `outfits`.
    outfit_index: HashMap<String, usize>,
}

impl StudioSnapshot {
    pub fn new(records: &[BookingRecord], outfits: Vec<Outfit>) -> Self {
        let normalized = normalize_records(records);
        let mut outfit_index = HashMap::with_capacity(outfits.len() * 2);
        for (idx, outfit) in outfits.iter().enumerate() {
            outfit_index.insert(outfit.id.clone(), idx);
        }
        // Ids win over design codes when the two collide.
        for (idx, outfit) in outfits.iter().enumerate() {
            if let Some(code) = &outfit.design_code {
                outfit_index.entry(code.clone()).or_insert(idx);
            }
        }
        Self {
            bookings: normalized.bookings,
            skipped: normalized.skipped,
            outfits,
            outfit_index,
        }
    }

    /// Look an outfit up by id or design code.
    pub fn outfit(&self, key: &str) -> Option<&Outfit> {
        self.outfit_index.get(key).map(|&idx| &self.outfits[idx])
    }

    pub fn outfits(&self) -> &[Outfit] {
        &self.outfits
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub loaded: usize,
    pub skipped: usize,
}

/// A check phrased against a studio's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioQuery {
    /// Outfit id or design code.
    pub outfit: String,
    #[serde(default)]
    pub size: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "DayPart::default_pickup")]
    pub pickup_slot: DayPart,
    #[serde(default = "DayPart::default_return")]
    pub return_slot: DayPart,
    /// Overrides the registry policy when set.
    #[serde(default)]
    pub buffer_days: Option<u32>,
    #[serde(default)]
    pub exclude_booking: Option<String>,
}

impl StudioQuery {
    pub fn new(outfit: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            outfit: outfit.into(),
            size: None,
            start,
            end,
            pickup_slot: DayPart::DEFAULT_PICKUP,
            return_slot: DayPart::DEFAULT_RETURN,
            buffer_days: None,
            exclude_booking: None,
        }
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }
}

/// Per-studio booking snapshots. Each studio (tenant) is isolated; a reload
/// swaps the whole snapshot so in-flight checks keep the one they started with.
pub struct StudioRegistry {
    studios: DashMap<String, Arc<StudioSnapshot>>,
    policy: Policy,
}

fn validate_studio_name(studio: &str) -> Result<(), AvailabilityError> {
    if studio.len() > MAX_STUDIO_NAME_LEN {
        return Err(AvailabilityError::InvalidStudio("studio name too long"));
    }
    if studio.is_empty()
        || !studio
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AvailabilityError::InvalidStudio(
            "studio name must be alphanumeric, '_' or '-'",
        ));
    }
    Ok(())
}

impl StudioRegistry {
    pub fn new(policy: Policy) -> Self {
        Self {
            studios: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Replace a studio's snapshot with freshly fetched records.
    pub fn load(
        &self,
        studio: &str,
        records: &[BookingRecord],
        outfits: Vec<Outfit>,
    ) -> Result<LoadStats, AvailabilityError> {
        validate_studio_name(studio)?;
        if !self.studios.contains_key(studio) && self.studios.len() >= MAX_STUDIOS {
            return Err(AvailabilityError::LimitExceeded("too many studios"));
        }

        let snapshot = StudioSnapshot::new(records, outfits);
        let stats = LoadStats {
            loaded: snapshot.bookings.len(),
            skipped: snapshot.skipped.len(),
        };
        self.studios.insert(studio.to_string(), Arc::new(snapshot));
        metrics::gauge!(crate::observability::STUDIOS_ACTIVE).set(self.studios.len() as f64);
        info!(studio, loaded = stats.loaded, skipped = stats.skipped, "studio snapshot loaded");
        Ok(stats)
    }

    pub fn snapshot(&self, studio: &str) -> Option<Arc<StudioSnapshot>> {
        self.studios.get(studio).map(|e| e.value().clone())
    }

    pub fn remove(&self, studio: &str) -> bool {
        let removed = self.studios.remove(studio).is_some();
        if removed {
            metrics::gauge!(crate::observability::STUDIOS_ACTIVE).set(self.studios.len() as f64);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.studios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.studios.is_empty()
    }

    fn resolve(&self, studio: &str) -> Result<Arc<StudioSnapshot>, AvailabilityError> {
        self.snapshot(studio)
            .ok_or_else(|| AvailabilityError::StudioNotFound(studio.to_string()))
    }

    /// Run an availability check against the studio's current snapshot.
    pub fn check(&self, studio: &str, query: &StudioQuery) -> Result<AvailabilityResult, AvailabilityError> {
        let snapshot = self.resolve(studio)?;
        let outfit = snapshot
            .outfit(&query.outfit)
            .ok_or_else(|| AvailabilityError::UnknownOutfit(query.outfit.clone()))?;

        let request = AvailabilityRequest {
            outfit: outfit.clone(),
            size: query.size.clone(),
            range: DateRange {
                start: query.start,
                end: query.end,
            },
            pickup_slot: query.pickup_slot,
            return_slot: query.return_slot,
            buffer_days: query.buffer_days.unwrap_or(self.policy.buffer_days),
            exclude_booking: query.exclude_booking.clone(),
        };
        check_availability(&snapshot.bookings, &request)
    }

    /// Calendar grid for one outfit and month, using the registry policy's buffer.
    pub fn month_grid(
        &self,
        studio: &str,
        outfit: &str,
        size: Option<&str>,
        year: i32,
        month: u32,
    ) -> Result<Vec<DayCell>, AvailabilityError> {
        let snapshot = self.resolve(studio)?;
        let outfit = snapshot
            .outfit(outfit)
            .ok_or_else(|| AvailabilityError::UnknownOutfit(outfit.to_string()))?;
        month_grid(&snapshot.bookings, outfit, size, year, month, self.policy.buffer_days)
    }
}
