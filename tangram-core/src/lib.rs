//! Core of the tangram puzzle: the seven pieces, the shape library, the transform
//! store, pointer gestures and the solution matcher. No rendering lives here.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod matcher;
pub mod observer;
pub mod piece;
pub mod session;
pub mod store;

pub use catalog::{Catalog, Category, Difficulty, Shape, SolutionEntry};
pub use config::{GameConfig, Presence, ScorePolicy, Tolerances};
pub use error::{
    CatalogError, ConfigError, TransformError, UnknownPieceError, UnknownShapeError,
};
pub use geometry::{MirrorScale, Point, Sign, normalized_angle_diff};
pub use gesture::{
    DirectInput, GestureController, GestureMode, GestureScope, PointerId, PointerInput,
    PointerKind, SurfaceFrame,
};
pub use matcher::{EntryDiagnostic, MatchReport, MatchResult, Matcher, Mismatch};
pub use observer::ObserverId;
pub use piece::{PieceDef, PieceId, PieceKind, PieceState, PieceView, Transform};
pub use session::{CheckOutcome, GameSession, Progress, SessionEvent, SessionSnapshot};
pub use store::{Arrangement, TransformStore};
