//! Overpass API client for hospital POIs

use super::record::Coordinates;
use super::HospitalConfig;
use crate::{MedchatError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Centroid reported for ways with `out center`
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct PoiCenter {
    pub lat: f64,
    pub lon: f64,
}

/// One node or way returned by the provider
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PoiElement {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<PoiCenter>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl PoiElement {
    /// Own position, else the way's center
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => Some(Coordinates::new(lat, lon)),
            (_, _, Some(center)) => Some(Coordinates::new(center.lat, center.lon)),
            _ => None,
        }
    }

    /// Tag value, treating blank values as absent
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<PoiElement>,
}

/// Overpass QL for hospital nodes and ways around a point
pub fn hospital_query(origin: Coordinates, radius_m: u32) -> String {
    format!(
        "[out:json];\n(\n  node[\"amenity\"=\"hospital\"](around:{r},{lat},{lng});\n  way[\"amenity\"=\"hospital\"](around:{r},{lat},{lng});\n);\nout center;",
        r = radius_m,
        lat = origin.lat,
        lng = origin.lng
    )
}

#[derive(Clone, Debug)]
pub struct OverpassClient {
    url: String,
    radius_m: u32,
    client: reqwest::Client,
}

impl OverpassClient {
    pub fn new(config: &HospitalConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            MedchatError::ConfigError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            url: config.overpass_url.clone(),
            radius_m: config.radius_m,
            client,
        })
    }

    /// Fetch raw hospital elements around `origin`
    pub async fn fetch_elements(&self, origin: Coordinates) -> Result<Vec<PoiElement>> {
        let query = hospital_query(origin, self.radius_m);
        debug!(
            "Querying {} for hospitals within {} m of ({}, {})",
            self.url, self.radius_m, origin.lat, origin.lng
        );

        let response = self
            .client
            .post(&self.url)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|e| MedchatError::HospitalLookupError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("POI provider returned {}", status);
            return Err(MedchatError::HospitalLookupError(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let body: OverpassResponse = response
            .json()
            .await
            .map_err(|e| MedchatError::HospitalLookupError(format!("Malformed response: {}", e)))?;

        debug!("POI provider returned {} elements", body.elements.len());
        Ok(body.elements)
    }
}
