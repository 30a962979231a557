//! Error types for sqlweave

use crate::placeholder::PlaceholderFormat;
use thiserror::Error;

/// Result type alias for rendering operations
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Errors reported while rendering a fragment tree.
///
/// Builders never fail while they are being assembled; every invariant is
/// checked when `render()` runs.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// UNION chain without any statement
    #[error("union requires at least one statement")]
    EmptyUnion,

    /// CASE without any WHEN clause
    #[error("case expression must contain at least one WHEN clause")]
    EmptyCase,

    /// WHEN clause that never received its THEN
    #[error("WHEN clause {index} must have a THEN part")]
    MissingThen { index: usize },

    /// THEN supplied while no WHEN was waiting for one
    #[error("THEN part {index} has no matching WHEN clause")]
    ThenWithoutWhen { index: usize },

    /// WITH clause without any common table expression
    #[error("WITH clause requires at least one common table expression")]
    EmptyWith,

    /// WITH clause without the statement that follows it
    #[error("WITH clause requires a main statement")]
    MissingStatement,

    /// Ordinal placeholder rewrite found the wrong number of markers
    #[error("{format:?} placeholders: found {markers} markers for {params} bound values")]
    PlaceholderMismatch {
        format: PlaceholderFormat,
        markers: usize,
        params: usize,
    },

    /// A union segment failed to render
    #[error("union segment {index}: {source}")]
    UnionSegment {
        index: usize,
        #[source]
        source: Box<WeaveError>,
    },

    /// A lateral subquery failed to render
    #[error("lateral source '{alias}': {source}")]
    Lateral {
        alias: String,
        #[source]
        source: Box<WeaveError>,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl WeaveError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a failure from the union segment at `index`.
    pub fn union_segment(index: usize, source: WeaveError) -> Self {
        Self::UnionSegment {
            index,
            source: Box::new(source),
        }
    }

    /// Wrap a failure from the lateral source aliased `alias`.
    pub fn lateral(alias: impl Into<String>, source: WeaveError) -> Self {
        Self::Lateral {
            alias: alias.into(),
            source: Box::new(source),
        }
    }

    /// Check if this error (or the error it wraps) reports an empty composite
    pub fn is_empty_composite(&self) -> bool {
        match self {
            Self::EmptyUnion | Self::EmptyCase | Self::EmptyWith => true,
            Self::UnionSegment { source, .. } | Self::Lateral { source, .. } => {
                source.is_empty_composite()
            }
            _ => false,
        }
    }

    /// Check if this error (or the error it wraps) is a placeholder count mismatch
    pub fn is_placeholder_mismatch(&self) -> bool {
        match self {
            Self::PlaceholderMismatch { .. } => true,
            Self::UnionSegment { source, .. } | Self::Lateral { source, .. } => {
                source.is_placeholder_mismatch()
            }
            _ => false,
        }
    }
}
