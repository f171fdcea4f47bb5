//! Crop calendar: regional crop recommendation and the month-by-month
//! cultivation timeline.

pub mod catalog;

pub use catalog::ReferenceData;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::AgriMandiError;
use crate::models::{CropDefinition, Difficulty, Profitability};

/// Margin added to both ends of a crop's temperature tolerance before
/// comparing against the regional range. Accounts for microclimates the
/// regional aggregates hide.
pub const TEMPERATURE_MARGIN_C: f64 = 5.0;

/// Absolute slack subtracted from a crop's rainfall minimum. Irrigation can
/// cover a shortfall of roughly this size.
pub const RAINFALL_SLACK_MM: f64 = 200.0;

/// What stage of cultivation a crop is in during a given month.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MonthPhase {
    Sowing,
    Growing,
    Harvest,
    Idle,
}

/// One crop's year at a glance.
#[derive(Debug, Clone, Serialize)]
pub struct CropTimeline {
    pub crop_id: String,
    pub name: String,
    pub months: [MonthPhase; 12],
    pub profitability: Profitability,
    pub difficulty: Difficulty,
}

/// Recommendation engine over the static reference data.
#[derive(Debug, Clone)]
pub struct CropCalendar {
    data: ReferenceData,
}

impl CropCalendar {
    #[must_use]
    pub fn new(data: ReferenceData) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn reference(&self) -> &ReferenceData {
        &self.data
    }

    /// Crops worth sowing in `region_id` during `month`.
    ///
    /// A crop qualifies when it is grown in the region, the month falls in
    /// its sowing window, and the regional climate is compatible with its
    /// tolerances (within the configured margins). An unknown region yields
    /// an empty list; a month outside 1-12 is a validation error.
    #[instrument(skip(self))]
    pub fn recommend(
        &self,
        region_id: &str,
        month: u8,
    ) -> crate::Result<Vec<&CropDefinition>> {
        if !(1..=12).contains(&month) {
            return Err(AgriMandiError::validation(format!(
                "Month must be between 1 and 12, got {month}"
            )));
        }

        let Some(region) = self.data.region(region_id) else {
            debug!(region_id, "Unknown region, returning no recommendations");
            return Ok(Vec::new());
        };

        let matches: Vec<&CropDefinition> = self
            .data
            .crops()
            .iter()
            .filter(|crop| {
                crop.grown_in(region_id)
                    && crop.sowing_window.contains(month)
                    && Self::climate_compatible(crop, region)
            })
            .collect();

        debug!(
            region_id,
            month,
            count = matches.len(),
            "Computed crop recommendations"
        );
        Ok(matches)
    }

    fn climate_compatible(
        crop: &CropDefinition,
        region: &crate::models::RegionProfile,
    ) -> bool {
        let temperature_ok = region
            .climate
            .temperature_c
            .overlaps(&crop.climate.temperature_c.widened(TEMPERATURE_MARGIN_C));
        let rainfall_ok =
            region.climate.annual_rainfall_mm >= crop.climate.rainfall_mm.min - RAINFALL_SLACK_MM;
        temperature_ok && rainfall_ok
    }

    /// Phase of cultivation for `crop` in `month`. Sowing and harvest windows
    /// take precedence over the growing stretch between them.
    #[must_use]
    pub fn month_phase(crop: &CropDefinition, month: u8) -> MonthPhase {
        if crop.sowing_window.contains(month) {
            return MonthPhase::Sowing;
        }
        if crop.harvest_window.contains(month) {
            return MonthPhase::Harvest;
        }
        // Forward distance around the calendar from the end of sowing.
        let fwd = |from: u8, to: u8| (i32::from(to) - i32::from(from)).rem_euclid(12);
        let to_month = fwd(crop.sowing_window.end, month);
        let to_harvest = fwd(crop.sowing_window.end, crop.harvest_window.start);
        if 0 < to_month && to_month < to_harvest {
            MonthPhase::Growing
        } else {
            MonthPhase::Idle
        }
    }

    /// Year-round timeline for every crop in the catalog.
    #[must_use]
    pub fn timeline(&self) -> Vec<CropTimeline> {
        self.data
            .crops()
            .iter()
            .map(|crop| {
                let mut months = [MonthPhase::Idle; 12];
                for (idx, slot) in months.iter_mut().enumerate() {
                    let month = u8::try_from(idx + 1).unwrap_or(1);
                    *slot = Self::month_phase(crop, month);
                }
                CropTimeline {
                    crop_id: crop.id.clone(),
                    name: crop.name.clone(),
                    months,
                    profitability: crop.profitability,
                    difficulty: crop.difficulty,
                }
            })
            .collect()
    }
}
