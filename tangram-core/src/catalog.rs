use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::PIECE_COUNT;
use crate::error::CatalogError;
use crate::geometry::{MirrorScale, Point};
use crate::piece::{PieceDef, PieceId};

const BUNDLED_CATALOG: &str = include_str!("../assets/tangram.json");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Animal,
    Object,
    Person,
    Nature,
}

impl Category {
    /// Library display order.
    pub const ALL: [Category; 4] = [
        Category::Animal,
        Category::Object,
        Category::Person,
        Category::Nature,
    ];
}

/// Target transform of one piece in a solved arrangement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionEntry {
    pub piece_id: PieceId,
    #[serde(rename = "position")]
    pub target_position: Point,
    #[serde(rename = "rotation")]
    pub target_rotation_deg: f64,
    /// When absent the piece may be mirrored either way.
    #[serde(rename = "scale", default, skip_serializing_if = "Option::is_none")]
    pub target_scale: Option<MirrorScale>,
}

/// A target silhouette in the shape library.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shape {
    pub id: String,
    pub name: String,
    // Optional Turkish label
    #[serde(default)]
    pub name_tr: Option<String>,
    pub icon: String,
    pub difficulty: Difficulty,
    pub category: Category,
    #[serde(default)]
    pub solution: Vec<SolutionEntry>,
}

impl Shape {
    pub fn has_solution(&self) -> bool {
        !self.solution.is_empty()
    }

    pub fn display_name(&self, lang: &str) -> &str {
        if lang.eq_ignore_ascii_case("tr")
            && let Some(n) = &self.name_tr
        {
            return n;
        }
        &self.name
    }
}

/// Read-only tables of piece definitions and target shapes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    pieces: Vec<PieceDef>,
    shapes: Vec<Shape>,
}

impl Catalog {
    /// The catalog compiled into the crate.
    pub fn bundled() -> Result<Catalog, CatalogError> {
        Catalog::from_json(BUNDLED_CATALOG)
    }

    pub fn from_json(text: &str) -> Result<Catalog, CatalogError> {
        let catalog: Catalog = serde_json::from_str(text)?;
        catalog.validate()?;
        log::debug!(
            "catalog loaded: {} pieces, {} shapes",
            catalog.pieces.len(),
            catalog.shapes.len()
        );
        Ok(catalog)
    }

    pub fn new(pieces: Vec<PieceDef>, shapes: Vec<Shape>) -> Result<Catalog, CatalogError> {
        let catalog = Catalog { pieces, shapes };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.pieces.len() != PIECE_COUNT {
            return Err(CatalogError::PieceCount {
                expected: PIECE_COUNT,
                found: self.pieces.len(),
            });
        }
        let mut piece_ids: HashSet<&str> = HashSet::new();
        for p in &self.pieces {
            if !piece_ids.insert(p.id.as_str()) {
                return Err(CatalogError::DuplicatePiece(p.id.to_string()));
            }
            if p.outline.len() < 3 {
                return Err(CatalogError::DegenerateOutline(p.id.to_string()));
            }
        }
        let mut shape_ids: HashSet<&str> = HashSet::new();
        for s in &self.shapes {
            if !shape_ids.insert(s.id.as_str()) {
                return Err(CatalogError::DuplicateShape(s.id.clone()));
            }
            let mut seen: HashSet<&str> = HashSet::new();
            for entry in &s.solution {
                let pid = entry.piece_id.as_str();
                if !piece_ids.contains(pid) {
                    return Err(CatalogError::UnknownSolutionPiece {
                        shape: s.id.clone(),
                        piece: pid.to_string(),
                    });
                }
                if !seen.insert(pid) {
                    return Err(CatalogError::RepeatedSolutionPiece {
                        shape: s.id.clone(),
                        piece: pid.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn pieces(&self) -> &[PieceDef] {
        &self.pieces
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        let trimmed = id.trim();
        self.shapes.iter().find(|s| s.id.eq_ignore_ascii_case(trimmed))
    }

    pub fn shapes_in(&self, category: Category) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(move |s| s.category == category)
    }
}
