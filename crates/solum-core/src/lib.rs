//! Solum core library — indexed query engine for pre-computed soil-survey
//! datasets.
//!
//! This crate loads denormalized JSON corpora (records plus precomputed
//! categorical indices) into immutable, TTL-refreshed snapshots and answers
//! filter/sort/paginate queries by combining index lookups with linear-scan
//! predicates. It also provides grouped counts and distribution statistics,
//! TTL memoization for expensive derived results, and the point-in-polygon
//! classification used to build the corpus. The HTTP route layer, catalog
//! proxying, and the CSV→JSON conversion pipeline live outside this crate
//! and call into it synchronously.

pub mod errors;
pub mod geo;
pub mod models;
pub mod query;
pub mod store;
pub mod time;

pub use errors::{SolumError, SolumResult};
pub use models::{
    CorpusRecord, FieldKind, FieldSpec, FieldValue, GranulometrySample, OwnedPage, Page,
    PsdRecord, Query, RangeBound, SoilPoint, SortOrder, SortSpec,
};
pub use store::corpus::Snapshot;
pub use store::dataset::{CorpusSource, DatasetStore, FileSource, SNAPSHOT_TTL};
