//! Ordering and searching hospital lists

use super::record::HospitalRecord;
use std::cmp::Ordering;

/// Distances closer than this are treated as a tie and ordered by rating
const DISTANCE_TIE_KM: f64 = 0.5;

/// Closer first, except near-ties which put the better-rated one first
///
/// Not transitive: A~B and B~C can hold while A and C are far apart.
pub fn compare(a: &HospitalRecord, b: &HospitalRecord) -> Ordering {
    if (a.distance_km - b.distance_km).abs() < DISTANCE_TIE_KM {
        b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
    } else {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    }
}

/// Stable insertion sort with `compare`
///
/// `slice::sort_by` requires a total order and may panic on `compare`.
pub fn rank(records: &mut [HospitalRecord]) {
    for i in 1..records.len() {
        let mut j = i;
        while j > 0 && compare(&records[j - 1], &records[j]) == Ordering::Greater {
            records.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Records whose name contains `term`, ignoring case, in their current order
pub fn search(records: &[HospitalRecord], term: &str) -> Vec<HospitalRecord> {
    let term = term.trim().to_lowercase();

    records
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&term))
        .cloned()
        .collect()
}
