//! State → macro-region static lookup.
//!
//! A pure table lookup, not a geometry test: maps a Brazilian state name or
//! its two-letter code to one of the five macro-regions. Unmapped input is
//! `None`, never an error.

/// The five macro-regions.
pub const MACRO_REGIONS: &[&str] = &["Norte", "Nordeste", "Centro-Oeste", "Sudeste", "Sul"];

const STATE_REGIONS: &[(&str, &str)] = &[
    // Norte
    ("Acre", "Norte"),
    ("Amapá", "Norte"),
    ("Amazonas", "Norte"),
    ("Pará", "Norte"),
    ("Rondônia", "Norte"),
    ("Roraima", "Norte"),
    ("Tocantins", "Norte"),
    // Nordeste
    ("Alagoas", "Nordeste"),
    ("Bahia", "Nordeste"),
    ("Ceará", "Nordeste"),
    ("Maranhão", "Nordeste"),
    ("Paraíba", "Nordeste"),
    ("Pernambuco", "Nordeste"),
    ("Piauí", "Nordeste"),
    ("Rio Grande do Norte", "Nordeste"),
    ("Sergipe", "Nordeste"),
    // Centro-Oeste
    ("Distrito Federal", "Centro-Oeste"),
    ("Goiás", "Centro-Oeste"),
    ("Mato Grosso", "Centro-Oeste"),
    ("Mato Grosso do Sul", "Centro-Oeste"),
    // Sudeste
    ("Espírito Santo", "Sudeste"),
    ("Minas Gerais", "Sudeste"),
    ("Rio de Janeiro", "Sudeste"),
    ("São Paulo", "Sudeste"),
    // Sul
    ("Paraná", "Sul"),
    ("Rio Grande do Sul", "Sul"),
    ("Santa Catarina", "Sul"),
];

const STATE_CODE_REGIONS: &[(&str, &str)] = &[
    // Norte
    ("AC", "Norte"),
    ("AP", "Norte"),
    ("AM", "Norte"),
    ("PA", "Norte"),
    ("RO", "Norte"),
    ("RR", "Norte"),
    ("TO", "Norte"),
    // Nordeste
    ("AL", "Nordeste"),
    ("BA", "Nordeste"),
    ("CE", "Nordeste"),
    ("MA", "Nordeste"),
    ("PB", "Nordeste"),
    ("PE", "Nordeste"),
    ("PI", "Nordeste"),
    ("RN", "Nordeste"),
    ("SE", "Nordeste"),
    // Centro-Oeste
    ("DF", "Centro-Oeste"),
    ("GO", "Centro-Oeste"),
    ("MT", "Centro-Oeste"),
    ("MS", "Centro-Oeste"),
    // Sudeste
    ("ES", "Sudeste"),
    ("MG", "Sudeste"),
    ("RJ", "Sudeste"),
    ("SP", "Sudeste"),
    // Sul
    ("PR", "Sul"),
    ("RS", "Sul"),
    ("SC", "Sul"),
];

/// Macro-region for a state name or two-letter code.
///
/// Tries the exact full name first, then the uppercased code.
pub fn macro_region_of(state: &str) -> Option<&'static str> {
    if state.is_empty() {
        return None;
    }
    if let Some(&(_, region)) = STATE_REGIONS.iter().find(|(name, _)| *name == state) {
        return Some(region);
    }
    let code = state.to_uppercase();
    STATE_CODE_REGIONS
        .iter()
        .find(|(sigla, _)| *sigla == code)
        .map(|&(_, region)| region)
}

/// State names belonging to `region`, sorted.
pub fn states_in_region(region: &str) -> Vec<&'static str> {
    let mut states: Vec<&'static str> = STATE_REGIONS
        .iter()
        .filter(|(_, r)| *r == region)
        .map(|&(name, _)| name)
        .collect();
    states.sort();
    states
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_names_resolve() {
        assert_eq!(macro_region_of("Goiás"), Some("Centro-Oeste"));
        assert_eq!(macro_region_of("São Paulo"), Some("Sudeste"));
        assert_eq!(macro_region_of("Pará"), Some("Norte"));
    }

    #[test]
    fn codes_resolve_case_insensitively() {
        assert_eq!(macro_region_of("RS"), Some("Sul"));
        assert_eq!(macro_region_of("rs"), Some("Sul"));
        assert_eq!(macro_region_of("Ba"), Some("Nordeste"));
    }

    #[test]
    fn unmapped_input_is_none() {
        assert_eq!(macro_region_of(""), None);
        assert_eq!(macro_region_of("Atlantis"), None);
        assert_eq!(macro_region_of("XX"), None);
    }

    #[test]
    fn every_state_maps_to_a_known_region() {
        assert_eq!(STATE_REGIONS.len(), 27);
        assert_eq!(STATE_CODE_REGIONS.len(), 27);
        for (_, region) in STATE_REGIONS.iter().chain(STATE_CODE_REGIONS) {
            assert!(MACRO_REGIONS.contains(region));
        }
    }

    #[test]
    fn reverse_lookup_is_sorted() {
        assert_eq!(
            states_in_region("Sul"),
            vec!["Paraná", "Rio Grande do Sul", "Santa Catarina"]
        );
        assert!(states_in_region("Oeste").is_empty());
    }
}
