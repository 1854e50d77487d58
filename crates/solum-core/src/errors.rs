//! Error types for the Solum core library.

/// Top-level error enum for the Solum core library.
///
/// Only the load class (`Load`/`Io`/`Json`) crosses the core boundary as a
/// failure; an unreadable polygon collection (`Geometry`) degrades to an
/// absent classifier layer, and negative query outcomes (index misses, empty
/// pages, unmapped states) are ordinary values, not errors.
#[derive(Debug, thiserror::Error)]
pub enum SolumError {
    #[error("Corpus load error: {0}")]
    Load(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polygon collection error: {0}")]
    Geometry(String),
}

pub type SolumResult<T> = Result<T, SolumError>;
