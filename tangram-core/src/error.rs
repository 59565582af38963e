use crate::piece::PieceId;

/// A store mutator was called with an id outside the fixed piece set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown piece id `{0}`")]
pub struct UnknownPieceError(pub PieceId);

/// A transform write was refused; the piece keeps its previous transform.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    UnknownPiece(#[from] UnknownPieceError),
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shape id `{0}`")]
pub struct UnknownShapeError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected {expected} pieces, catalog has {found}")]
    PieceCount { expected: usize, found: usize },
    #[error("piece id `{0}` is defined twice")]
    DuplicatePiece(String),
    #[error("shape id `{0}` is defined twice")]
    DuplicateShape(String),
    #[error("shape `{shape}` references unknown piece `{piece}`")]
    UnknownSolutionPiece { shape: String, piece: String },
    #[error("shape `{shape}` lists piece `{piece}` more than once")]
    RepeatedSolutionPiece { shape: String, piece: String },
    #[error("piece `{0}` needs at least three outline points")]
    DegenerateOutline(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tolerance `{name}` must be a finite non-negative number, got {value}")]
    Tolerance { name: &'static str, value: f64 },
}
