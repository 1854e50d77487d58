//! Corpus snapshot: records, provenance metadata, and categorical indices.
//!
//! The on-disk corpus is a three-key JSON document — `metadata` (free-form
//! provenance), `data` (flat record array), `indices` (category name →
//! label → record positions). That shape is shared with the ETL pipeline
//! that produces the files and must be preserved exactly.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::errors::{SolumError, SolumResult};
use crate::models::CorpusRecord;

/// Label → sorted record positions, one map per indexed category.
pub type CategoryIndex = IndexMap<String, Vec<usize>>;

/// Outcome of a categorical index probe.
#[derive(Debug, PartialEq, Eq)]
pub enum IndexLookup<'a> {
    /// No index exists for the field; fall back to a linear scan.
    NoIndex,
    /// The index exists but carries no canonicalized match (or an empty
    /// position list); the query short-circuits to an empty result.
    Miss,
    /// Matching position list.
    Hit(&'a [usize]),
}

#[derive(Deserialize)]
struct RawCorpus<R> {
    #[serde(default)]
    metadata: serde_json::Value,
    data: Vec<R>,
    indices: IndexMap<String, CategoryIndex>,
}

/// An immutable, wholly-swapped view of one dataset.
///
/// Positions held by the indices refer into `records`; they are validated at
/// construction and never change afterwards — reload installs a brand-new
/// snapshot instead of mutating this one.
#[derive(Debug)]
pub struct Snapshot<R> {
    pub metadata: serde_json::Value,
    pub records: Vec<R>,
    indices: IndexMap<String, CategoryIndex>,
}

impl<R: CorpusRecord> Snapshot<R> {
    /// Parse and validate a corpus document.
    ///
    /// Missing `data`/`indices` keys surface as a JSON error; an index
    /// position outside `records` is a structural load error.
    pub fn from_slice(bytes: &[u8]) -> SolumResult<Self> {
        let raw: RawCorpus<R> = serde_json::from_slice(bytes)?;
        let snapshot = Snapshot {
            metadata: raw.metadata,
            records: raw.data,
            indices: raw.indices,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn from_str(text: &str) -> SolumResult<Self> {
        Self::from_slice(text.as_bytes())
    }

    fn validate(&self) -> SolumResult<()> {
        let len = self.records.len();
        for (category, index) in &self.indices {
            for (label, positions) in index {
                if let Some(&bad) = positions.iter().find(|&&p| p >= len) {
                    return Err(SolumError::Load(format!(
                        "index {category}[{label}] position {bad} out of range ({len} records)"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Category index by its corpus name (e.g. `"byBiome"`).
    pub fn index(&self, name: &str) -> Option<&CategoryIndex> {
        self.indices.get(name)
    }

    /// Category index backing a schema field, if the corpus carries one.
    pub fn index_for_field(&self, field: &str) -> Option<&CategoryIndex> {
        R::index_name(field).and_then(|name| self.index(name))
    }

    /// Probe the index for `field` with a case-folded `value`.
    ///
    /// Index keys are stored exactly as built; the query value is folded and
    /// compared against folded keys, so `"cerrado"` matches `"Cerrado"`.
    pub fn lookup(&self, field: &str, value: &str) -> IndexLookup<'_> {
        let Some(index) = self.index_for_field(field) else {
            return IndexLookup::NoIndex;
        };
        let folded = value.to_lowercase();
        match index
            .iter()
            .find(|(label, _)| label.to_lowercase() == folded)
        {
            Some((_, positions)) if !positions.is_empty() => IndexLookup::Hit(positions),
            _ => IndexLookup::Miss,
        }
    }
}
