use geo_types::Polygon;

use crate::catalog::Catalog;
use crate::error::{TransformError, UnknownPieceError};
use crate::geometry::{self, MirrorScale, Point};
use crate::observer::{ObserverId, Observers};
use crate::piece::{PieceDef, PieceId, PieceState, PieceView, Transform};

/// Anything that can report the current state of a piece by id.
pub trait Arrangement {
    fn piece_state(&self, id: &PieceId) -> Option<PieceState>;
}

impl Arrangement for std::collections::HashMap<PieceId, PieceState> {
    fn piece_state(&self, id: &PieceId) -> Option<PieceState> {
        self.get(id).copied()
    }
}

impl Arrangement for std::collections::BTreeMap<PieceId, PieceState> {
    fn piece_state(&self, id: &PieceId) -> Option<PieceState> {
        self.get(id).copied()
    }
}

/// Single source of truth for the transforms of the fixed piece set.
///
/// Every mutator notifies subscribers with the full piece list. Mutators called
/// with an id outside the set fail with [`UnknownPieceError`] and change nothing.
/// Positions and rotations must stay finite; non-finite writes are refused.
#[derive(Debug)]
pub struct TransformStore {
    defs: Vec<PieceDef>,
    states: Vec<PieceState>,
    // draw order, last entry is on top
    z_order: Vec<usize>,
    observers: Observers<[PieceView]>,
}

impl TransformStore {
    pub fn new(catalog: &Catalog) -> Self {
        let defs = catalog.pieces().to_vec();
        let states = defs.iter().map(|d| PieceState::parked(d.parked_at)).collect();
        let z_order = (0..defs.len()).collect();
        TransformStore {
            defs,
            states,
            z_order,
            observers: Observers::new(),
        }
    }

    fn index(&self, id: &str) -> Result<usize, UnknownPieceError> {
        self.defs
            .iter()
            .position(|d| d.id.as_str() == id)
            .ok_or_else(|| {
                log::warn!("rejected mutation for unknown piece `{id}`");
                UnknownPieceError(PieceId::new(id))
            })
    }

    fn mutate(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut PieceState, &PieceDef),
    ) -> Result<(), UnknownPieceError> {
        let idx = self.index(id)?;
        f(&mut self.states[idx], &self.defs[idx]);
        self.notify();
        Ok(())
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let views = self.views();
        self.observers.notify(&views);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.iter().any(|d| d.id.as_str() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &PieceId> {
        self.defs.iter().map(|d| &d.id)
    }

    pub fn def(&self, id: &str) -> Result<&PieceDef, UnknownPieceError> {
        Ok(&self.defs[self.index(id)?])
    }

    pub fn get(&self, id: &str) -> Result<Transform, UnknownPieceError> {
        Ok(self.states[self.index(id)?].transform)
    }

    pub fn state(&self, id: &str) -> Result<PieceState, UnknownPieceError> {
        Ok(self.states[self.index(id)?])
    }

    pub fn set_position(&mut self, id: &str, pos: Point) -> Result<(), TransformError> {
        let pos = finite_point(pos)?;
        Ok(self.mutate(id, |s, _| s.transform.position = pos)?)
    }

    /// Absolute rotation in degrees, stored as given.
    pub fn set_rotation(&mut self, id: &str, degrees: f64) -> Result<(), TransformError> {
        let degrees = finite("rotation", degrees)?;
        Ok(self.mutate(id, |s, _| s.transform.rotation_deg = degrees)?)
    }

    /// Relative rotation added to the stored value.
    pub fn rotate_by(&mut self, id: &str, delta_deg: f64) -> Result<(), TransformError> {
        let next = finite("rotation", self.get(id)?.rotation_deg + delta_deg)?;
        Ok(self.mutate(id, |s, _| s.transform.rotation_deg = next)?)
    }

    pub fn set_scale(&mut self, id: &str, scale: MirrorScale) -> Result<(), UnknownPieceError> {
        self.mutate(id, |s, _| s.transform.scale = scale)
    }

    pub fn flip(&mut self, id: &str) -> Result<(), UnknownPieceError> {
        self.mutate(id, |s, _| s.transform.scale = s.transform.scale.flip_x())
    }

    pub fn set_on_board(&mut self, id: &str, on_board: bool) -> Result<(), UnknownPieceError> {
        self.mutate(id, |s, _| s.on_board = on_board)
    }

    /// Move a piece from the palette onto the board at `at`.
    pub fn place_on_board(&mut self, id: &str, at: Point) -> Result<(), TransformError> {
        let at = finite_point(at)?;
        self.mutate(id, |s, _| {
            s.on_board = true;
            s.transform.position = at;
        })?;
        Ok(self.raise(id)?)
    }

    /// Return one piece to its parked transform.
    pub fn park(&mut self, id: &str) -> Result<(), UnknownPieceError> {
        self.mutate(id, |s, d| *s = PieceState::parked(d.parked_at))
    }

    /// Park every piece. Depends only on the piece definitions, never on prior state.
    pub fn reset_all(&mut self) {
        for (s, d) in self.states.iter_mut().zip(self.defs.iter()) {
            *s = PieceState::parked(d.parked_at);
        }
        self.z_order = (0..self.defs.len()).collect();
        self.notify();
    }

    /// Swap in the piece table of another catalog. Every piece starts parked; subscribers stay.
    pub fn replace_pieces(&mut self, catalog: &Catalog) {
        self.defs = catalog.pieces().to_vec();
        self.states = vec![PieceState::default(); self.defs.len()];
        self.reset_all();
    }

    /// Bring a piece to the top of the draw order.
    pub fn raise(&mut self, id: &str) -> Result<(), UnknownPieceError> {
        let idx = self.index(id)?;
        if self.z_order.last() != Some(&idx) {
            self.z_order.retain(|i| *i != idx);
            self.z_order.push(idx);
            self.notify();
        }
        Ok(())
    }

    /// Pieces in draw order, bottom first.
    pub fn views(&self) -> Vec<PieceView> {
        self.z_order
            .iter()
            .map(|&i| PieceView {
                id: self.defs[i].id.clone(),
                kind: self.defs[i].kind,
                color: self.defs[i].color.clone(),
                state: self.states[i],
            })
            .collect()
    }

    pub fn subscribe(&mut self, f: impl FnMut(&[PieceView]) + 'static) -> ObserverId {
        self.observers.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Outline of the piece as currently placed on the surface.
    pub fn world_outline(&self, id: &str) -> Result<Polygon<f64>, UnknownPieceError> {
        let idx = self.index(id)?;
        let t = self.states[idx].transform;
        Ok(geometry::place_outline(
            &self.defs[idx].outline,
            t.position,
            t.rotation_deg,
            t.scale,
        ))
    }

    /// Visual centre of the piece in surface space.
    pub fn center(&self, id: &str) -> Result<Point, UnknownPieceError> {
        Ok(self.get(id)?.position + geometry::frame_pivot())
    }

    /// Topmost on-board piece whose placed outline contains `p`.
    pub fn piece_at(&self, p: Point) -> Option<&PieceId> {
        self.z_order.iter().rev().find_map(|&i| {
            let s = &self.states[i];
            if !s.on_board {
                return None;
            }
            let poly = geometry::place_outline(
                &self.defs[i].outline,
                s.transform.position,
                s.transform.rotation_deg,
                s.transform.scale,
            );
            geometry::polygon_contains(&poly, p).then_some(&self.defs[i].id)
        })
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, TransformError> {
    if value.is_finite() {
        Ok(value)
    } else {
        log::warn!("rejected non-finite {field}: {value}");
        Err(TransformError::NonFinite { field, value })
    }
}

fn finite_point(p: Point) -> Result<Point, TransformError> {
    Ok(Point::new(finite("position", p.x)?, finite("position", p.y)?))
}

impl Arrangement for TransformStore {
    fn piece_state(&self, id: &PieceId) -> Option<PieceState> {
        self.state(id.as_str()).ok()
    }
}
