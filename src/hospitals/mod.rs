//! Nearby hospital lookup
//!
//! Queries a POI provider for `amenity=hospital` elements around the user,
//! keeps only entries a patient can act on (a name plus an address or a
//! phone number), and ranks them by distance with a rating tie-break.

pub mod listing;
pub mod overpass;
pub mod ranking;
pub mod record;

pub use listing::{extract_hospitals, format_entry, HospitalFinder, HospitalListing};
pub use overpass::{OverpassClient, OverpassResponse, PoiCenter, PoiElement};
pub use ranking::{compare, rank, search};
pub use record::{synthesized_rating, Coordinates, HospitalRecord, StarRating};

use serde::{Deserialize, Serialize};

/// Configuration for hospital lookups
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalConfig {
    /// Overpass interpreter endpoint
    pub overpass_url: String,

    /// Search radius around the user in meters
    pub radius_m: u32,
}

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            radius_m: 5000,
        }
    }
}

impl HospitalConfig {
    pub fn with_overpass_url(mut self, url: impl Into<String>) -> Self {
        self.overpass_url = url.into();
        self
    }

    pub fn with_radius_m(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HospitalConfig::default();
        assert_eq!(config.radius_m, 5000);
        assert!(config.overpass_url.starts_with("https://overpass-api.de"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: HospitalConfig = toml::from_str("radius_m = 2500").unwrap();
        assert_eq!(config.radius_m, 2500);
        assert_eq!(config.overpass_url, HospitalConfig::default().overpass_url);
    }
}
