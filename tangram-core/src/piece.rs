use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{MirrorScale, Point};

/// Stable identity of one of the seven pieces.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceId(String);

impl PieceId {
    pub fn new(id: impl Into<String>) -> Self {
        PieceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for PieceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PieceId {
    fn from(s: &str) -> Self {
        PieceId(s.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    LargeTriangle,
    MediumTriangle,
    SmallTriangle,
    Square,
    Parallelogram,
}

/// Static definition of a piece as read from the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PieceDef {
    pub id: PieceId,
    pub kind: PieceKind,
    /// Polygon in the un-rotated, un-mirrored local frame.
    pub outline: Vec<Point>,
    pub color: String,
    /// Resting position while the piece sits in the palette.
    #[serde(default)]
    pub parked_at: Point,
}

/// Position, rotation and mirror-scale of a piece.
///
/// `rotation_deg` is unbounded; it is only reduced modulo 360 when compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point,
    #[serde(rename = "rotation")]
    pub rotation_deg: f64,
    pub scale: MirrorScale,
}

impl Transform {
    pub fn parked(at: Point) -> Self {
        Transform {
            position: at,
            rotation_deg: 0.0,
            scale: MirrorScale::IDENTITY,
        }
    }
}

/// Mutable state of one piece held by the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PieceState {
    #[serde(flatten)]
    pub transform: Transform,
    pub on_board: bool,
}

impl PieceState {
    pub fn parked(at: Point) -> Self {
        PieceState {
            transform: Transform::parked(at),
            on_board: false,
        }
    }
}

/// Read-only view handed to observers and serialized for the shell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceView {
    pub id: PieceId,
    pub kind: PieceKind,
    pub color: String,
    #[serde(flatten)]
    pub state: PieceState,
}
