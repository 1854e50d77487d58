//! Single-key ordering and offset/limit pagination over filtered positions.

use std::cmp::Ordering;

use crate::models::{CorpusRecord, FieldValue, Page, SortOrder, SortSpec};
use crate::store::corpus::Snapshot;

/// Order `positions` by the declared sort key.
///
/// Text fields compare by their lowercased form with a raw tie-break
/// (accent-tolerant lexicographic ordering); numeric fields compare
/// numerically. Null values order before every present value, keeping the
/// comparator a total order. No sort spec is a no-op.
pub fn sort_positions<R: CorpusRecord>(
    snapshot: &Snapshot<R>,
    mut positions: Vec<usize>,
    sort: Option<&SortSpec>,
) -> Vec<usize> {
    let Some(spec) = sort else {
        return positions;
    };
    if R::field_spec(&spec.by).is_none() {
        // Unknown key: permissive policy, keep the filtered order.
        return positions;
    }

    positions.sort_by(|&a, &b| {
        let va = snapshot.records[a].field(&spec.by);
        let vb = snapshot.records[b].field(&spec.by);
        let ordering = compare_values(va, vb);
        match spec.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    positions
}

fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (FieldValue::Number(x), FieldValue::Number(y)) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

// Cross-kind ordering: nulls first, then numbers, then text. A schema-typed
// field only ever mixes Null with one present kind.
fn rank(value: FieldValue<'_>) -> u8 {
    match value {
        FieldValue::Null => 0,
        FieldValue::Number(_) => 1,
        FieldValue::Text(_) => 2,
    }
}

/// Slice the `[offset, offset + limit)` window out of `positions`.
///
/// Slicing past the end yields an empty page, never an error; `total` always
/// reports the pre-pagination count.
pub fn paginate<'a, R: CorpusRecord>(
    snapshot: &'a Snapshot<R>,
    positions: &[usize],
    limit: usize,
    offset: usize,
) -> Page<'a, R> {
    let total = positions.len();
    let start = offset.min(total);
    let end = start.saturating_add(limit).min(total);
    let records: Vec<&R> = positions[start..end]
        .iter()
        .map(|&p| &snapshot.records[p])
        .collect();
    Page {
        total,
        returned: records.len(),
        limit,
        offset,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Query, SoilPoint};
    use crate::query::filter::filter_positions;

    fn snapshot() -> Snapshot<SoilPoint> {
        let mk = |id: &str, dc: &str, mu: Option<&str>, depth: Option<f64>| SoilPoint {
            id: id.to_string(),
            longitude: -47.5,
            latitude: -15.6,
            depth,
            log_clay_sand: None,
            log_silt_sand: None,
            dataset_code: dc.to_string(),
            state: Some("GO".to_string()),
            municipality: mu.map(String::from),
            biome: Some("Cerrado".to_string()),
            title: "t".to_string(),
            doi: None,
            url: "u".to_string(),
            csv_uri: "c".to_string(),
        };
        let records = vec![
            mk("p0", "ctb0005", Some("brasília"), Some(30.0)),
            mk("p1", "ctb0001", Some("Anápolis"), Some(10.0)),
            mk("p2", "ctb0003", None, None),
            mk("p3", "ctb0002", Some("anápolis"), Some(50.0)),
            mk("p4", "ctb0004", Some("Brasília"), Some(20.0)),
        ];
        let data = serde_json::to_string(&records).unwrap();
        let json = format!(r#"{{"metadata":{{}},"data":{data},"indices":{{}}}}"#);
        Snapshot::from_str(&json).unwrap()
    }

    fn all(snap: &Snapshot<SoilPoint>) -> Vec<usize> {
        (0..snap.len()).collect()
    }

    #[test]
    fn no_sort_key_preserves_order() {
        let snap = snapshot();
        assert_eq!(
            sort_positions(&snap, vec![3, 1, 4], None),
            vec![3, 1, 4]
        );
    }

    #[test]
    fn numeric_sort_ascending_and_descending() {
        let snap = snapshot();
        let spec = SortSpec {
            by: "depth".to_string(),
            order: SortOrder::Asc,
        };
        // p2 has a null depth and orders before every present value.
        assert_eq!(
            sort_positions(&snap, all(&snap), Some(&spec)),
            vec![2, 1, 4, 0, 3]
        );

        let desc = SortSpec {
            by: "depth".to_string(),
            order: SortOrder::Desc,
        };
        assert_eq!(
            sort_positions(&snap, all(&snap), Some(&desc)),
            vec![3, 0, 4, 1, 2]
        );
    }

    #[test]
    fn text_sort_folds_case() {
        let snap = snapshot();
        let spec = SortSpec {
            by: "municipality".to_string(),
            order: SortOrder::Asc,
        };
        // "Anápolis"/"anápolis" fold together; the raw tie-break puts the
        // uppercase form first within each folded group.
        assert_eq!(
            sort_positions(&snap, vec![0, 1, 3, 4], Some(&spec)),
            vec![1, 3, 4, 0]
        );
    }

    #[test]
    fn unknown_sort_key_is_a_no_op() {
        let snap = snapshot();
        let spec = SortSpec {
            by: "bogus".to_string(),
            order: SortOrder::Desc,
        };
        assert_eq!(
            sort_positions(&snap, vec![2, 0, 1], Some(&spec)),
            vec![2, 0, 1]
        );
    }

    #[test]
    fn paginate_windows_the_filtered_sequence() {
        let snap = snapshot();
        let positions = filter_positions(&snap, &Query::new());
        assert_eq!(positions.len(), 5);

        let page = paginate(&snap, &positions, 2, 1);
        assert_eq!(page.total, 5);
        assert_eq!(page.returned, 2);
        // Positions [1, 2] of the filtered sequence, not record ids.
        assert_eq!(page.records[0].id, "p1");
        assert_eq!(page.records[1].id, "p2");
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let snap = snapshot();
        let positions = all(&snap);
        let page = paginate(&snap, &positions, 100, 99);
        assert_eq!(page.total, 5);
        assert_eq!(page.returned, 0);
        assert!(page.records.is_empty());
    }

    #[test]
    fn paginate_clamps_the_tail_window() {
        let snap = snapshot();
        let positions = all(&snap);
        let page = paginate(&snap, &positions, 10, 3);
        assert_eq!(page.returned, 2);
        assert_eq!(page.records[0].id, "p3");
    }
}
