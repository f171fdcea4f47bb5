//! Crop definitions: what a crop tolerates, where it is grown and when it
//! goes into the ground.

use serde::{Deserialize, Serialize};

/// Inclusive calendar-month range, 1-12, possibly wrapping the year boundary
/// (e.g. November through January is `{ start: 11, end: 1 }`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: u8,
    pub end: u8,
}

impl MonthWindow {
    /// Whether `month` lies within the window, honouring wraparound.
    ///
    /// `start == end` denotes a single-month window.
    #[must_use]
    pub fn contains(&self, month: u8) -> bool {
        if self.start <= self.end {
            self.start <= month && month <= self.end
        } else {
            month >= self.start || month <= self.end
        }
    }

    /// Both endpoints are valid month numbers.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        (1..=12).contains(&self.start) && (1..=12).contains(&self.end)
    }
}

/// Closed numeric range used for temperature, rainfall and humidity bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.min <= self.max
    }

    /// Whether the two closed ranges share at least one point.
    #[must_use]
    pub fn overlaps(&self, other: &ValueRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// Range widened by `margin` on both ends.
    #[must_use]
    pub fn widened(&self, margin: f64) -> ValueRange {
        ValueRange {
            min: self.min - margin,
            max: self.max + margin,
        }
    }
}

/// The temperature, rainfall and humidity conditions a crop can endure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClimateTolerance {
    /// Temperature range in degrees Celsius
    pub temperature_c: ValueRange,
    /// Rainfall range in millimetres over the growing season
    pub rainfall_mm: ValueRange,
    /// Relative humidity range in percent
    pub humidity_pct: ValueRange,
}

/// A named cultivar of a crop with its own windows and growing regions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropVariety {
    pub name: String,
    pub duration: String,
    pub expected_yield: String,
    pub characteristics: Vec<String>,
    pub sowing_months: Vec<u8>,
    pub harvest_months: Vec<u8>,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Irrigation,
    Fertilization,
    PestControl,
    General,
}

/// One step of the farming roadmap, scheduled by day offset from sowing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldTask {
    pub day: u16,
    pub name: String,
    pub description: String,
    pub kind: TaskKind,
}

/// Indicative mandi price range for the crop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketPriceRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Profitability {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Static description of a crop. Loaded once at startup from the embedded
/// catalog and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropDefinition {
    pub id: String,
    pub name: String,
    /// Kharif, Rabi or Year-round
    pub season: String,
    pub duration: String,
    pub soil_types: Vec<String>,
    pub sowing_window: MonthWindow,
    pub harvest_window: MonthWindow,
    pub climate: ClimateTolerance,
    /// Regions where the crop has historically been grown
    pub applicable_regions: Vec<String>,
    pub market_price: MarketPriceRange,
    pub profitability: Profitability,
    pub difficulty: Difficulty,
    pub varieties: Vec<CropVariety>,
    pub tasks: Vec<FieldTask>,
}

impl CropDefinition {
    /// Region eligibility check used by the recommendation filter.
    #[must_use]
    pub fn grown_in(&self, region_id: &str) -> bool {
        self.applicable_regions.iter().any(|r| r == region_id)
    }
}
