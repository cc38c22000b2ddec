//! Hospital list outcomes as shown to the user

use super::overpass::{OverpassClient, PoiElement};
use super::ranking::{rank, search};
use super::record::{Coordinates, HospitalRecord};
use super::HospitalConfig;
use crate::language::Language;
use crate::Result;
use rand::Rng;
use tracing::{info, warn};

/// Result of one nearby-hospital lookup
#[derive(Clone, Debug, PartialEq)]
pub enum HospitalListing {
    /// Ranked records; empty when every element was filtered out
    Found(Vec<HospitalRecord>),
    /// The provider returned no elements at all
    NoneNearby,
    /// The lookup failed
    Failed(String),
}

impl HospitalListing {
    pub fn records(&self) -> &[HospitalRecord] {
        match self {
            HospitalListing::Found(records) => records,
            _ => &[],
        }
    }

    /// Localized one-line status for the list header
    pub fn status(&self, language: Language) -> String {
        let phrases = language.phrases();
        match self {
            HospitalListing::Found(records) if records.is_empty() => {
                phrases.no_matching_hospitals.to_string()
            }
            HospitalListing::Found(records) => {
                format!("{} ({})", phrases.hospitals_found, records.len())
            }
            HospitalListing::NoneNearby => phrases.no_hospitals_nearby.to_string(),
            HospitalListing::Failed(_) => phrases.hospital_lookup_failed.to_string(),
        }
    }

    /// Narrow a found list by name; other outcomes are returned unchanged
    pub fn filtered(&self, term: &str) -> HospitalListing {
        match self {
            HospitalListing::Found(records) => HospitalListing::Found(search(records, term)),
            other => other.clone(),
        }
    }
}

/// Turn raw elements into filtered, ranked records
pub fn extract_hospitals<R: Rng>(
    elements: &[PoiElement],
    origin: Coordinates,
    rng: &mut R,
) -> Vec<HospitalRecord> {
    let mut records: Vec<HospitalRecord> = elements
        .iter()
        .filter_map(|el| HospitalRecord::from_element(el, origin, rng))
        .collect();

    rank(&mut records);
    records
}

/// Multi-line entry for the console list
pub fn format_entry(record: &HospitalRecord, language: Language) -> String {
    let phrases = language.phrases();

    format!(
        "{}  📍 {:.1} km  {} {:.1}\n   {}\n   {}",
        record.name,
        record.distance_km,
        record.stars(),
        record.rating,
        record
            .address
            .as_deref()
            .unwrap_or(phrases.address_unavailable),
        record.phone.as_deref().unwrap_or(phrases.phone_unavailable),
    )
}

/// Looks up and ranks hospitals around a point
pub struct HospitalFinder {
    client: OverpassClient,
}

impl HospitalFinder {
    pub fn new(config: &HospitalConfig) -> Result<Self> {
        Ok(Self {
            client: OverpassClient::new(config)?,
        })
    }

    /// Filtered and ranked records around `origin`, with every outcome folded
    /// into a listing
    pub async fn listing(&self, origin: Coordinates) -> HospitalListing {
        match self.client.fetch_elements(origin).await {
            Ok(elements) if elements.is_empty() => HospitalListing::NoneNearby,
            Ok(elements) => {
                let records = extract_hospitals(&elements, origin, &mut rand::thread_rng());
                info!(
                    "{} of {} hospital elements kept",
                    records.len(),
                    elements.len()
                );
                HospitalListing::Found(records)
            }
            Err(e) => {
                warn!("Hospital lookup failed: {}", e);
                HospitalListing::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(name: &str, address: Option<&str>, phone: Option<&str>) -> HospitalRecord {
        HospitalRecord {
            name: name.to_string(),
            address: address.map(str::to_string),
            phone: phone.map(str::to_string),
            location: Coordinates::new(0.0, 0.0),
            rating: 4.5,
            rating_is_synthesized: true,
            distance_km: 1.234,
        }
    }

    #[test]
    fn test_status_messages() {
        let found = HospitalListing::Found(vec![record("A", None, Some("1"))]);
        assert_eq!(found.status(Language::En), "Found Hospitals (1)");
        assert_eq!(
            HospitalListing::Found(vec![]).status(Language::En),
            "No matching hospitals found."
        );
        assert_eq!(
            HospitalListing::NoneNearby.status(Language::Hi),
            Language::Hi.phrases().no_hospitals_nearby
        );
        assert_eq!(
            HospitalListing::Failed("timeout".into()).status(Language::Mr),
            Language::Mr.phrases().hospital_lookup_failed
        );
    }

    #[test]
    fn test_filtered_listing() {
        let listing = HospitalListing::Found(vec![
            record("Ruby Hall", None, Some("1")),
            record("Sassoon", Some("Station Rd"), None),
        ]);

        assert_eq!(listing.filtered("ruby").records().len(), 1);
        assert_eq!(
            listing.filtered("apollo").status(Language::En),
            "No matching hospitals found."
        );
        assert_eq!(HospitalListing::NoneNearby.filtered("x"), HospitalListing::NoneNearby);
    }

    #[test]
    fn test_extract_filters_and_ranks() {
        let elements: Vec<PoiElement> = serde_json::from_str(
            r#"[
                {"lat":0.0,"lon":0.05,"tags":{"name":"Far","phone":"1","rating":"5"}},
                {"lat":0.0,"lon":0.001,"tags":{"name":"Near","addr:street":"Main St","rating":"3.9"}},
                {"lat":0.0,"lon":0.002,"tags":{"name":"No contact"}},
                {"lat":0.0,"lon":0.003,"tags":{"phone":"2"}}
            ]"#,
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let records = extract_hospitals(&elements, Coordinates::new(0.0, 0.0), &mut rng);

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
    }

    #[test]
    fn test_format_entry_uses_localized_placeholders() {
        let entry = format_entry(&record("Ruby Hall", None, Some("020 1234")), Language::En);
        assert!(entry.starts_with("Ruby Hall  📍 1.2 km  ★★★★⯪ 4.5"));
        assert!(entry.contains("Address not available"));
        assert!(entry.contains("020 1234"));

        let entry = format_entry(&record("Ruby Hall", Some("Pune"), None), Language::Hi);
        assert!(entry.contains(Language::Hi.phrases().phone_unavailable));
    }
}
