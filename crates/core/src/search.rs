//! Local clinic search.
//!
//! Filtering happens entirely on the already-loaded list; nothing is sent upstream.

use crate::models::ClinicRecord;

/// Returns the clinics whose name, address or any service tag contains `query`,
/// case-insensitively, in their original order.
///
/// The query is trimmed before matching as well as for the blank check, so stray
/// whitespace from a search box (`"Nairobi "`) still matches. A blank query returns the
/// whole list.
pub fn filter_clinics(clinics: &[ClinicRecord], query: &str) -> Vec<ClinicRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return clinics.to_vec();
    }
    clinics
        .iter()
        .filter(|clinic| matches_clinic(clinic, &needle))
        .cloned()
        .collect()
}

fn matches_clinic(clinic: &ClinicRecord, needle: &str) -> bool {
    clinic.name.to_lowercase().contains(needle)
        || clinic.address.to_lowercase().contains(needle)
        || clinic
            .services()
            .iter()
            .any(|service| service.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clinic::fixtures::clinic;

    fn sample() -> Vec<ClinicRecord> {
        vec![
            clinic("Aga Khan University Hospital", "3rd Parklands Ave, Nairobi", &["Cardiology", "Emergency"], Some(4.7)),
            clinic("Coast General", "Moi Ave, Mombasa", &["Maternity"], Some(4.1)),
            clinic("Kisumu Eye Centre", "Oginga Odinga St, Kisumu", &["Ophthalmology", "Pharmacy"], None),
        ]
    }

    #[test]
    fn test_blank_query_returns_everything_in_order() {
        let clinics = sample();
        assert_eq!(filter_clinics(&clinics, ""), clinics);
        assert_eq!(filter_clinics(&clinics, "   "), clinics);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let clinics = sample();
        let found = filter_clinics(&clinics, "NAIROBI");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Aga Khan University Hospital");
    }

    #[test]
    fn test_matches_service_tags_and_preserves_order() {
        let clinics = sample();
        let found = filter_clinics(&clinics, "a");
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Aga Khan University Hospital", "Coast General", "Kisumu Eye Centre"]
        );

        let found = filter_clinics(&clinics, "pharm");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Kisumu Eye Centre");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let found = filter_clinics(&sample(), "  Nairobi ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Aga Khan University Hospital");
    }

    #[test]
    fn test_no_match_returns_empty() {
        assert!(filter_clinics(&sample(), "dentist in Eldoret").is_empty());
    }
}
