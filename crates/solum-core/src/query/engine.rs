//! Query orchestration: normalize, filter, sort, paginate.

use serde_json::json;

use crate::models::{CorpusRecord, OwnedPage, Page, Query};
use crate::query::cache::{cache_key, ResultCache};
use crate::query::filter::filter_positions;
use crate::query::guards::{clamp_limit, clamp_offset, normalize_bounds};
use crate::query::sort::{paginate, sort_positions};
use crate::store::corpus::Snapshot;

/// Answer `query` against `snapshot`.
pub fn run_query<'a, R: CorpusRecord>(snapshot: &'a Snapshot<R>, query: &Query) -> Page<'a, R> {
    let positions = filter_positions(snapshot, query);
    let ordered = sort_positions(snapshot, positions, query.sort.as_ref());
    paginate(
        snapshot,
        &ordered,
        clamp_limit(query.limit),
        clamp_offset(query.offset),
    )
}

/// Answer `query`, memoizing the owned page in `cache`.
///
/// The cache key canonicalizes the normalized query, so permuted but
/// logically identical requests share one entry.
pub fn run_query_cached<R: CorpusRecord>(
    snapshot: &Snapshot<R>,
    query: &Query,
    cache: &ResultCache<OwnedPage<R>>,
) -> OwnedPage<R> {
    let key = query_cache_key(query);
    if let Some(page) = cache.get(&key) {
        return page;
    }
    let page = run_query(snapshot, query).to_owned();
    cache.set(key, page.clone());
    page
}

/// Canonical cache key for a query: every predicate as a `name:json(value)`
/// pair, plus the resolved sort and pagination.
pub fn query_cache_key(query: &Query) -> String {
    let mut pairs: Vec<(String, serde_json::Value)> = Vec::new();
    for (field, value) in &query.equals {
        pairs.push((field.clone(), json!(value)));
    }
    for (field, needle) in &query.contains {
        pairs.push((format!("{field}.contains"), json!(needle)));
    }
    for bound in &query.ranges {
        let (min, max) = normalize_bounds(bound.min, bound.max);
        if let Some(lo) = min {
            pairs.push((format!("{}.min", bound.field), json!(lo)));
        }
        if let Some(hi) = max {
            pairs.push((format!("{}.max", bound.field), json!(hi)));
        }
    }
    if let Some(sort) = &query.sort {
        pairs.push(("sortBy".to_string(), json!(sort.by)));
        pairs.push(("sortOrder".to_string(), json!(sort.order)));
    }
    pairs.push(("limit".to_string(), json!(clamp_limit(query.limit))));
    pairs.push(("offset".to_string(), json!(clamp_offset(query.offset))));
    cache_key(&pairs)
}
