//! Hospital records built from POI elements

use super::overpass::PoiElement;
use crate::{MedchatError, Result};
use rand::Rng;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Address tags, joined in this order
const ADDRESS_TAGS: [&str; 4] = ["addr:housenumber", "addr:street", "addr:city", "addr:full"];

/// A point on the globe in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in km (haversine)
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// A hospital the user could go to
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HospitalRecord {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub location: Coordinates,
    /// Out of five, one decimal
    pub rating: f64,
    /// The provider had no usable rating, so one was made up
    pub rating_is_synthesized: bool,
    pub distance_km: f64,
}

impl HospitalRecord {
    /// Build a record from a POI element, or `None` if it is not actionable
    ///
    /// Kept only with a name and at least one of address or phone.
    pub fn from_element<R: Rng>(
        element: &PoiElement,
        origin: Coordinates,
        rng: &mut R,
    ) -> Option<Self> {
        let name = element.tag("name")?.to_string();

        let parts: Vec<&str> = ADDRESS_TAGS.iter().filter_map(|t| element.tag(t)).collect();
        let address = (!parts.is_empty()).then(|| parts.join(", "));
        let phone = element
            .tag("phone")
            .or_else(|| element.tag("contact:phone"))
            .map(str::to_string);

        if address.is_none() && phone.is_none() {
            return None;
        }

        let location = element.coordinates()?;

        let provided = element
            .tag("rating")
            .and_then(|r| r.parse::<f64>().ok())
            .filter(|r| r.is_finite());
        let (rating, rating_is_synthesized) = match provided {
            Some(r) => (round_one_decimal(r), false),
            None => (synthesized_rating(rng), true),
        };

        Some(Self {
            name,
            address,
            phone,
            location,
            rating,
            rating_is_synthesized,
            distance_km: origin.distance_km(&location),
        })
    }

    /// Google Maps search link for this hospital
    pub fn maps_search_url(&self) -> Result<String> {
        let query = format!(
            "{} hospital {}",
            self.name,
            self.address.as_deref().unwrap_or_default()
        );

        Url::parse_with_params(
            "https://www.google.com/maps/search/",
            &[("api", "1"), ("query", query.as_str())],
        )
        .map(String::from)
        .map_err(|e| MedchatError::HospitalLookupError(format!("Bad maps link: {}", e)))
    }

    pub fn stars(&self) -> StarRating {
        StarRating::from_rating(self.rating)
    }
}

/// Plausible rating for hospitals the provider has no rating for
pub fn synthesized_rating<R: Rng>(rng: &mut R) -> f64 {
    round_one_decimal(rng.gen_range(3.5..=5.0))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Five-star breakdown of a rating
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StarRating {
    pub full: u8,
    pub half: u8,
    pub empty: u8,
}

impl StarRating {
    pub fn from_rating(rating: f64) -> Self {
        let rating = rating.clamp(0.0, 5.0);
        let full = rating.floor() as u8;
        let half = u8::from(rating.fract() > 0.0);

        Self {
            full,
            half,
            empty: 5 - full - half,
        }
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.full {
            write!(f, "★")?;
        }
        if self.half > 0 {
            write!(f, "⯪")?;
        }
        for _ in 0..self.empty {
            write!(f, "☆")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn element(json: &str) -> PoiElement {
        serde_json::from_str(json).unwrap()
    }

    fn origin() -> Coordinates {
        Coordinates::new(18.5204, 73.8567)
    }

    #[test]
    fn test_distance_km() {
        let pune = origin();
        let mumbai = Coordinates::new(19.0760, 72.8777);
        let d = pune.distance_km(&mumbai);
        assert!((d - 120.0).abs() < 5.0, "distance was {}", d);
        assert_eq!(pune.distance_km(&pune), 0.0);
    }

    #[test]
    fn test_record_from_node() {
        let mut rng = StdRng::seed_from_u64(7);
        let el = element(
            r#"{"type":"node","lat":18.53,"lon":73.85,"tags":{
                "name":"Ruby Hall Clinic","addr:housenumber":"40","addr:street":"Sassoon Road",
                "addr:city":"Pune","contact:phone":"+91 20 6645 5100","rating":"4.46"}}"#,
        );

        let record = HospitalRecord::from_element(&el, origin(), &mut rng).unwrap();
        assert_eq!(record.name, "Ruby Hall Clinic");
        assert_eq!(record.address.as_deref(), Some("40, Sassoon Road, Pune"));
        assert_eq!(record.phone.as_deref(), Some("+91 20 6645 5100"));
        assert_eq!(record.rating, 4.5);
        assert!(!record.rating_is_synthesized);
        assert!(record.distance_km > 0.5 && record.distance_km < 2.0);
    }

    #[test]
    fn test_way_uses_center() {
        let mut rng = StdRng::seed_from_u64(7);
        let el = element(
            r#"{"type":"way","center":{"lat":18.52,"lon":73.86},"tags":{"name":"Sassoon","phone":"020 2612 8000"}}"#,
        );

        let record = HospitalRecord::from_element(&el, origin(), &mut rng).unwrap();
        assert_eq!(record.location, Coordinates::new(18.52, 73.86));
        assert!(record.address.is_none());
    }

    #[test]
    fn test_unactionable_elements_are_dropped() {
        let mut rng = StdRng::seed_from_u64(7);
        let no_name = element(r#"{"lat":1.0,"lon":1.0,"tags":{"phone":"123"}}"#);
        let no_contact = element(r#"{"lat":1.0,"lon":1.0,"tags":{"name":"Nowhere"}}"#);
        let blank_name = element(r#"{"lat":1.0,"lon":1.0,"tags":{"name":"  ","phone":"123"}}"#);
        let no_tags = element(r#"{"lat":1.0,"lon":1.0}"#);

        for el in [no_name, no_contact, blank_name, no_tags] {
            assert!(HospitalRecord::from_element(&el, origin(), &mut rng).is_none());
        }
    }

    #[test]
    fn test_unparseable_rating_is_synthesized() {
        let mut rng = StdRng::seed_from_u64(42);
        let el = element(
            r#"{"lat":18.5,"lon":73.8,"tags":{"name":"City Care","phone":"1","rating":"good"}}"#,
        );

        let record = HospitalRecord::from_element(&el, origin(), &mut rng).unwrap();
        assert!(record.rating_is_synthesized);
        assert!((3.5..=5.0).contains(&record.rating));
    }

    #[test]
    fn test_synthesized_rating_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let r = synthesized_rating(&mut rng);
            assert!((3.5..=5.0).contains(&r));
            assert_eq!(r, round_one_decimal(r));
        }
    }

    #[test]
    fn test_maps_search_url() {
        let record = HospitalRecord {
            name: "Jehangir".into(),
            address: Some("32 Sassoon Road".into()),
            phone: None,
            location: origin(),
            rating: 4.2,
            rating_is_synthesized: false,
            distance_km: 1.0,
        };

        let url = record.maps_search_url().unwrap();
        assert!(url.starts_with("https://www.google.com/maps/search/?api=1&query="));
        assert!(url.contains("Jehangir+hospital+32+Sassoon+Road"));
    }

    #[test]
    fn test_star_rating() {
        assert_eq!(
            StarRating::from_rating(4.8),
            StarRating { full: 4, half: 1, empty: 0 }
        );
        assert_eq!(
            StarRating::from_rating(4.0),
            StarRating { full: 4, half: 0, empty: 1 }
        );
        assert_eq!(
            StarRating::from_rating(3.5),
            StarRating { full: 3, half: 1, empty: 1 }
        );
        assert_eq!(StarRating::from_rating(5.0).to_string(), "★★★★★");
        assert_eq!(StarRating::from_rating(3.5).to_string(), "★★★⯪☆");
    }
}
