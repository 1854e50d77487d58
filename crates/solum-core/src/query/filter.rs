//! Predicate filter pipeline.
//!
//! Combines one index-accelerated categorical lookup with linear-scan
//! predicates over the narrowed working set. The working set is a list of
//! record positions, so relative corpus order is preserved end to end.

use crate::models::{CorpusRecord, FieldValue, Query, RangeBound};
use crate::query::guards::normalize_bounds;
use crate::store::corpus::{IndexLookup, Snapshot};

/// Apply every predicate of `query` and return the surviving positions.
///
/// Categorical predicates run in their declared order. The first one probes
/// the field's index: a hit seeds the working set without a full scan, a
/// miss on an existing index short-circuits the whole query to empty, and a
/// field with no index at all falls back to a linear equality scan. Every
/// subsequent categorical predicate tests linearly over the already-narrowed
/// working set — re-consulting an index there would need a sorted-list
/// intersection for no measurable gain on the small remainder.
pub fn filter_positions<R: CorpusRecord>(snapshot: &Snapshot<R>, query: &Query) -> Vec<usize> {
    // None = the full corpus, materialized lazily on the first linear pass.
    let mut working: Option<Vec<usize>> = None;

    for (i, (field, value)) in query.equals.iter().enumerate() {
        if i == 0 {
            match snapshot.lookup(field, value) {
                IndexLookup::Hit(positions) => {
                    working = Some(positions.to_vec());
                    continue;
                }
                IndexLookup::Miss => return Vec::new(),
                IndexLookup::NoIndex => {}
            }
        }
        let folded = value.to_lowercase();
        working = Some(retain(snapshot, working, |record| {
            text_equals_folded(record.field(field), &folded)
        }));
        if working.as_ref().is_some_and(Vec::is_empty) {
            return Vec::new();
        }
    }

    for (field, needle) in &query.contains {
        let folded = needle.to_lowercase();
        working = Some(retain(snapshot, working, |record| {
            text_contains_folded(record.field(field), &folded)
        }));
    }

    for bound in &query.ranges {
        let (min, max) = normalize_bounds(bound.min, bound.max);
        if min.is_none() && max.is_none() {
            continue;
        }
        let bound = RangeBound {
            field: bound.field.clone(),
            min,
            max,
        };
        working = Some(retain(snapshot, working, |record| {
            in_range(record.field(&bound.field), bound.min, bound.max)
        }));
    }

    working.unwrap_or_else(|| (0..snapshot.len()).collect())
}

fn retain<R: CorpusRecord>(
    snapshot: &Snapshot<R>,
    working: Option<Vec<usize>>,
    mut keep: impl FnMut(&R) -> bool,
) -> Vec<usize> {
    match working {
        Some(positions) => positions
            .into_iter()
            .filter(|&p| keep(&snapshot.records[p]))
            .collect(),
        None => (0..snapshot.len())
            .filter(|&p| keep(&snapshot.records[p]))
            .collect(),
    }
}

fn text_equals_folded(value: FieldValue<'_>, folded: &str) -> bool {
    match value {
        FieldValue::Text(s) => s.to_lowercase() == folded,
        // Numeric categoricals (layerId, year) match on their canonical
        // decimal rendering.
        FieldValue::Number(n) => format_number(n) == folded,
        FieldValue::Null => false,
    }
}

fn text_contains_folded(value: FieldValue<'_>, folded: &str) -> bool {
    match value {
        FieldValue::Text(s) => s.to_lowercase().contains(folded),
        _ => false,
    }
}

fn in_range(value: FieldValue<'_>, min: Option<f64>, max: Option<f64>) -> bool {
    let Some(n) = value.as_number() else {
        return false;
    };
    if let Some(lo) = min {
        if n < lo {
            return false;
        }
    }
    if let Some(hi) = max {
        if n > hi {
            return false;
        }
    }
    true
}

/// Render a numeric label the way index keys store it: integers without a
/// trailing `.0`.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GranulometrySample, Query};

    fn sample(
        dataset: &str,
        biome: Option<&str>,
        municipality: Option<&str>,
        layer: i64,
        depth_final: f64,
        clay: Option<f64>,
    ) -> GranulometrySample {
        GranulometrySample {
            dataset_id: dataset.to_string(),
            observation_id: format!("{dataset}-obs"),
            longitude: -47.5,
            latitude: -15.6,
            layer_id: layer,
            depth_initial: 0.0,
            depth_final,
            coarse_fraction: Some(10.0),
            clay_fraction: clay,
            silt_fraction: Some(280.0),
            sand_fraction: Some(400.0),
            biome: biome.map(String::from),
            state: Some("Goiás".to_string()),
            region: Some("Centro-Oeste".to_string()),
            municipality: municipality.map(String::from),
        }
    }

    fn snapshot() -> Snapshot<GranulometrySample> {
        let records = vec![
            sample("ctb0001", Some("Cerrado"), Some("Goiânia"), 1, 20.0, Some(310.0)),
            sample("ctb0002", Some("Caatinga"), Some("Petrolina"), 1, 40.0, Some(150.0)),
            sample("ctb0001", Some("Cerrado"), Some("Anápolis"), 2, 60.0, None),
            sample("ctb0003", None, Some("Goiânia"), 2, 100.0, Some(480.0)),
            sample("ctb0001", Some("Cerrado"), None, 3, 20.0, Some(220.0)),
        ];
        let data = serde_json::to_string(&records).unwrap();
        let json = format!(
            r#"{{"metadata":{{}},"data":{data},
                "indices":{{
                    "byBiome":{{"Cerrado":[0,2,4],"Caatinga":[1]}},
                    "byDataset":{{"ctb0001":[0,2,4],"ctb0002":[1],"ctb0003":[3]}},
                    "byLayer":{{"1":[0,1],"2":[2,3],"3":[4]}}
                }}}}"#
        );
        Snapshot::from_str(&json).unwrap()
    }

    #[test]
    fn indexed_lookup_returns_positions_in_order() {
        let snap = snapshot();
        let query = Query::new().equals("biome", "Cerrado");
        assert_eq!(filter_positions(&snap, &query), vec![0, 2, 4]);
    }

    #[test]
    fn index_lookup_is_case_insensitive() {
        let snap = snapshot();
        let query = Query::new().equals("biome", "cerrado");
        assert_eq!(filter_positions(&snap, &query), vec![0, 2, 4]);
    }

    #[test]
    fn miss_on_existing_index_short_circuits() {
        let snap = snapshot();
        let query = Query::new()
            .equals("biome", "Pantanal")
            .range("depthFinal", None, Some(500.0));
        assert_eq!(filter_positions(&snap, &query), Vec::<usize>::new());
    }

    #[test]
    fn unindexed_field_falls_back_to_linear_scan() {
        let snap = snapshot();
        // state is indexable by schema but this corpus carries no byState.
        let query = Query::new().equals("state", "goiás");
        assert_eq!(filter_positions(&snap, &query), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn second_categorical_is_linear_over_working_set() {
        let snap = snapshot();
        let query = Query::new()
            .equals("datasetId", "ctb0001")
            .equals("layerId", "2");
        assert_eq!(filter_positions(&snap, &query), vec![2]);
    }

    #[test]
    fn numeric_categorical_matches_decimal_rendering() {
        let snap = snapshot();
        let query = Query::new().equals("layerId", "3");
        assert_eq!(filter_positions(&snap, &query), vec![4]);
    }

    #[test]
    fn substring_filter_folds_case() {
        let snap = snapshot();
        let query = Query::new().contains("municipality", "goi");
        assert_eq!(filter_positions(&snap, &query), vec![0, 3]);
    }

    #[test]
    fn null_text_never_matches_substring() {
        let snap = snapshot();
        let query = Query::new().contains("municipality", "");
        // Record 4 has no municipality; the empty needle matches the rest.
        assert_eq!(filter_positions(&snap, &query), vec![0, 1, 2, 3]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let snap = snapshot();
        let query = Query::new().range("depthFinal", Some(20.0), Some(60.0));
        assert_eq!(filter_positions(&snap, &query), vec![0, 1, 2, 4]);
    }

    #[test]
    fn inverted_bounds_behave_like_swapped() {
        let snap = snapshot();
        let inverted = Query::new().range("depthFinal", Some(60.0), Some(20.0));
        let straight = Query::new().range("depthFinal", Some(20.0), Some(60.0));
        assert_eq!(
            filter_positions(&snap, &inverted),
            filter_positions(&snap, &straight)
        );
    }

    #[test]
    fn null_value_fails_a_bounded_range() {
        let snap = snapshot();
        let query = Query::new().range("clayFraction", Some(0.0), None);
        // Record 2 has a null clayFraction.
        assert_eq!(filter_positions(&snap, &query), vec![0, 1, 3, 4]);
    }

    #[test]
    fn no_predicates_returns_everything() {
        let snap = snapshot();
        assert_eq!(filter_positions(&snap, &Query::new()), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn combined_pipeline_preserves_corpus_order() {
        let snap = snapshot();
        let query = Query::new()
            .equals("biome", "cerrado")
            .contains("municipality", "a")
            .range("depthFinal", Some(0.0), Some(80.0));
        assert_eq!(filter_positions(&snap, &query), vec![0, 2]);
    }
}
