//! Embedded reference data: the crop catalog and the region profiles.
//!
//! Both datasets ship inside the binary and are loaded once at startup.
//! All consumers borrow from a single [`ReferenceData`] instance.

use anyhow::{Context, bail};
use tracing::info;

use crate::models::{CropDefinition, RegionProfile};

const CROPS_JSON: &str = include_str!("crops.json");
const REGIONS_JSON: &str = include_str!("regions.json");

/// Immutable crop and region reference data.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    crops: Vec<CropDefinition>,
    regions: Vec<RegionProfile>,
}

impl ReferenceData {
    /// Load and validate the embedded catalog.
    pub fn embedded() -> anyhow::Result<Self> {
        let data = Self::from_json(CROPS_JSON, REGIONS_JSON)?;
        info!(
            crops = data.crops.len(),
            regions = data.regions.len(),
            "Loaded embedded reference data"
        );
        Ok(data)
    }

    /// Parse a catalog from JSON strings and validate its invariants.
    pub fn from_json(crops_json: &str, regions_json: &str) -> anyhow::Result<Self> {
        let crops: Vec<CropDefinition> =
            serde_json::from_str(crops_json).context("Failed to parse crop catalog")?;
        let regions: Vec<RegionProfile> =
            serde_json::from_str(regions_json).context("Failed to parse region profiles")?;

        let data = Self { crops, regions };
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for crop in &self.crops {
            if !crop.sowing_window.is_well_formed() {
                bail!("Crop '{}' has a malformed sowing window", crop.id);
            }
            if !crop.harvest_window.is_well_formed() {
                bail!("Crop '{}' has a malformed harvest window", crop.id);
            }
            if !crop.climate.temperature_c.is_well_formed()
                || !crop.climate.rainfall_mm.is_well_formed()
                || !crop.climate.humidity_pct.is_well_formed()
            {
                bail!("Crop '{}' has a malformed climate tolerance range", crop.id);
            }
            if crop.applicable_regions.is_empty() {
                bail!("Crop '{}' has no applicable regions", crop.id);
            }
        }
        for region in &self.regions {
            if !region.climate.temperature_c.is_well_formed() {
                bail!("Region '{}' has a malformed temperature range", region.id);
            }
            if region.climate.annual_rainfall_mm < 0.0 {
                bail!("Region '{}' has negative annual rainfall", region.id);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn crops(&self) -> &[CropDefinition] {
        &self.crops
    }

    #[must_use]
    pub fn regions(&self) -> &[RegionProfile] {
        &self.regions
    }

    /// Look up a region by its id (the state name).
    #[must_use]
    pub fn region(&self, id: &str) -> Option<&RegionProfile> {
        self.regions.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_loads() {
        let data = ReferenceData::embedded().unwrap();
        assert_eq!(data.crops().len(), 8);
        assert_eq!(data.regions().len(), 12);
    }

    #[test]
    fn test_region_lookup() {
        let data = ReferenceData::embedded().unwrap();
        let punjab = data.region("Punjab").unwrap();
        assert_eq!(punjab.climate.annual_rainfall_mm, 600.0);
        assert!(data.region("Atlantis").is_none());
    }

    #[test]
    fn test_malformed_window_rejected() {
        let crops = r#"[{
            "id": "bogus", "name": "Bogus", "season": "Kharif", "duration": "90 days",
            "soil_types": ["Loamy"],
            "sowing_window": { "start": 0, "end": 13 },
            "harvest_window": { "start": 9, "end": 10 },
            "climate": {
                "temperature_c": { "min": 10, "max": 30 },
                "rainfall_mm": { "min": 400, "max": 800 },
                "humidity_pct": { "min": 50, "max": 70 }
            },
            "applicable_regions": ["Punjab"],
            "market_price": { "min": 1000, "max": 2000, "unit": "quintal" },
            "profitability": "medium", "difficulty": "easy",
            "varieties": [], "tasks": []
        }]"#;
        let err = ReferenceData::from_json(crops, "[]").unwrap_err();
        assert!(err.to_string().contains("sowing window"));
    }
}
