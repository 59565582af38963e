use std::collections::HashMap;

use serde::Serialize;

use crate::constants::HANDLE_BIAS_DEG;
use crate::error::UnknownPieceError;
use crate::geometry::{Point, heading_degrees};
use crate::piece::PieceId;
use crate::store::TransformStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    pub fn from_pointer_type(value: &str) -> Self {
        match value {
            "touch" => PointerKind::Touch,
            "pen" => PointerKind::Pen,
            _ => PointerKind::Mouse,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub i32);

/// One raw pointer sample in client (viewport) coordinates.
#[derive(Clone, Copy, Debug)]
pub struct PointerInput {
    pub id: PointerId,
    pub kind: PointerKind,
    pub client: Point,
}

impl PointerInput {
    pub fn new(id: i32, kind: PointerKind, x: f64, y: f64) -> Self {
        PointerInput {
            id: PointerId(id),
            kind,
            client: Point::new(x, y),
        }
    }

    pub fn touch(id: i32, x: f64, y: f64) -> Self {
        Self::new(id, PointerKind::Touch, x, y)
    }

    pub fn mouse(x: f64, y: f64) -> Self {
        Self::new(1, PointerKind::Mouse, x, y)
    }
}

/// Placement of the puzzle surface in client coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceFrame {
    /// Client coordinates of the surface's top-left corner.
    pub origin: Point,
}

impl SurfaceFrame {
    pub fn at(x: f64, y: f64) -> Self {
        SurfaceFrame {
            origin: Point::new(x, y),
        }
    }

    pub fn to_surface(&self, client: Point) -> Point {
        client - self.origin
    }

    pub fn to_client(&self, surface: Point) -> Point {
        surface + self.origin
    }
}

/// Acquires the process-wide input subscription a gesture needs while it runs.
///
/// The guard lives inside the gesture session and is dropped with it, on every
/// path that ends the session: last contact lifted, cancellation, or controller drop.
pub trait GestureScope {
    type Guard;

    fn acquire(&mut self, piece: &PieceId) -> Self::Guard;
}

/// Scope for callers that deliver every event to the controller themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectInput;

impl GestureScope for DirectInput {
    type Guard = ();

    fn acquire(&mut self, _piece: &PieceId) {}
}

/// Public view of what a piece's gesture is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureMode {
    Idle,
    Drag,
    RotateByHandle,
    RotateByTwist,
}

#[derive(Clone, Copy, Debug)]
enum Mode {
    // contacts remain but nothing is driven by them
    Idle,
    Drag {
        pointer: PointerId,
        offset: Point,
    },
    RotateByHandle {
        pointer: PointerId,
        center: Point,
    },
    RotateByTwist {
        pointers: [PointerId; 2],
        initial_angle: f64,
        initial_rotation: f64,
    },
}

impl Mode {
    fn public(&self) -> GestureMode {
        match self {
            Mode::Idle => GestureMode::Idle,
            Mode::Drag { .. } => GestureMode::Drag,
            Mode::RotateByHandle { .. } => GestureMode::RotateByHandle,
            Mode::RotateByTwist { .. } => GestureMode::RotateByTwist,
        }
    }

    fn drives(&self, id: PointerId) -> bool {
        match *self {
            Mode::Idle => false,
            Mode::Drag { pointer, .. } | Mode::RotateByHandle { pointer, .. } => pointer == id,
            Mode::RotateByTwist { pointers, .. } => pointers.contains(&id),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Contact {
    id: PointerId,
    kind: PointerKind,
    client: Point,
}

struct GestureSession<G> {
    frame: SurfaceFrame,
    contacts: Vec<Contact>,
    mode: Mode,
    _guard: G,
}

impl<G> GestureSession<G> {
    fn contact(&self, id: PointerId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    fn twist_angle(&self, pointers: [PointerId; 2]) -> Option<f64> {
        let a = self.contact(pointers[0])?;
        let b = self.contact(pointers[1])?;
        Some(heading_degrees(a.client, b.client))
    }
}

/// Turns pointer streams into transform updates, one session per piece.
///
/// Sessions are independent: two fingers on two different pieces drive two
/// sessions at once. Within a session one contact drags, two touch contacts
/// twist, and a handle grab rotates about the piece centre. Dropping from two
/// contacts to one stops the twist without resuming the drag; a new gesture is
/// needed to drag again.
pub struct GestureController<S: GestureScope = DirectInput> {
    scope: S,
    sessions: HashMap<PieceId, GestureSession<S::Guard>>,
    owners: HashMap<PointerId, PieceId>,
    handle_bias_deg: f64,
}

impl Default for GestureController<DirectInput> {
    fn default() -> Self {
        GestureController::new(DirectInput, HANDLE_BIAS_DEG)
    }
}

impl<S: GestureScope> GestureController<S> {
    pub fn new(scope: S, handle_bias_deg: f64) -> Self {
        GestureController {
            scope,
            sessions: HashMap::new(),
            owners: HashMap::new(),
            handle_bias_deg,
        }
    }

    pub fn mode(&self, piece: &str) -> Option<GestureMode> {
        self.sessions.get(piece).map(|s| s.mode.public())
    }

    pub fn is_active(&self, piece: &str) -> bool {
        self.sessions.contains_key(piece)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Piece whose session owns `pointer`, if any.
    pub fn owner(&self, pointer: PointerId) -> Option<&PieceId> {
        self.owners.get(&pointer)
    }

    /// The single piece with exactly one touch contact, if there is exactly one
    /// such piece. A second finger that lands beside the piece joins it.
    pub fn lone_touch_target(&self) -> Option<&PieceId> {
        let mut found = self.sessions.iter().filter(|(_, s)| {
            s.contacts.len() == 1 && s.contacts[0].kind == PointerKind::Touch
        });
        let first = found.next();
        match found.next() {
            Some(_) => None,
            None => first.map(|(id, _)| id),
        }
    }

    fn session_entry(
        &mut self,
        store: &TransformStore,
        piece: &str,
        frame: SurfaceFrame,
        input: &PointerInput,
    ) -> Result<PieceId, UnknownPieceError> {
        let id = store.def(piece)?.id.clone();
        // a pointer id reused before its up event arrived belongs to the new gesture
        if let Some(prev) = self.owners.get(&input.id).cloned() {
            self.lift(&prev, input.id);
        }
        if !self.sessions.contains_key(&id) {
            log::debug!("gesture session opened for {id}");
            let guard = self.scope.acquire(&id);
            self.sessions.insert(
                id.clone(),
                GestureSession {
                    frame,
                    contacts: Vec::new(),
                    mode: Mode::Idle,
                    _guard: guard,
                },
            );
        }
        self.owners.insert(input.id, id.clone());
        if let Some(session) = self.sessions.get_mut(&id) {
            session.contacts.push(Contact {
                id: input.id,
                kind: input.kind,
                client: input.client,
            });
        }
        Ok(id)
    }

    /// A pointer went down on `piece`.
    ///
    /// The first contact starts a drag that keeps the grab offset. A second touch
    /// contact cancels the drag and starts a twist whose baseline is the rotation
    /// the piece has at that moment.
    pub fn pointer_down(
        &mut self,
        store: &mut TransformStore,
        piece: &str,
        frame: SurfaceFrame,
        input: PointerInput,
    ) -> Result<GestureMode, UnknownPieceError> {
        let id = self.session_entry(store, piece, frame, &input)?;
        let transform = store.get(id.as_str())?;
        let Some(session) = self.sessions.get_mut(&id) else {
            return Ok(GestureMode::Idle);
        };
        match (session.mode, session.contacts.len()) {
            (Mode::Idle, 1) => {
                let grab = session.frame.to_surface(input.client);
                session.mode = Mode::Drag {
                    pointer: input.id,
                    offset: grab - transform.position,
                };
                store.raise(id.as_str())?;
            }
            (Mode::Idle | Mode::Drag { .. }, 2) => {
                let both_touch = session
                    .contacts
                    .iter()
                    .all(|c| c.kind == PointerKind::Touch);
                if both_touch {
                    let pointers = [session.contacts[0].id, session.contacts[1].id];
                    if let Some(initial_angle) = session.twist_angle(pointers) {
                        session.mode = Mode::RotateByTwist {
                            pointers,
                            initial_angle,
                            initial_rotation: transform.rotation_deg,
                        };
                    }
                }
            }
            _ => {}
        }
        let mode = session.mode.public();
        log::debug!("{id}: pointer {:?} down -> {mode:?}", input.id);
        Ok(mode)
    }

    /// A pointer grabbed the rotation handle of `piece`.
    ///
    /// The piece centre is fixed in client space here; later moves set the rotation
    /// to the absolute pointer angle around it.
    pub fn begin_handle_rotation(
        &mut self,
        store: &mut TransformStore,
        piece: &str,
        frame: SurfaceFrame,
        input: PointerInput,
    ) -> Result<GestureMode, UnknownPieceError> {
        let id = self.session_entry(store, piece, frame, &input)?;
        let center = store.center(id.as_str())?;
        let Some(session) = self.sessions.get_mut(&id) else {
            return Ok(GestureMode::Idle);
        };
        if matches!(session.mode, Mode::Idle) {
            session.mode = Mode::RotateByHandle {
                pointer: input.id,
                center: session.frame.to_client(center),
            };
            store.raise(id.as_str())?;
        }
        Ok(session.mode.public())
    }

    /// Apply a move sample. Returns false when no active gesture uses the pointer.
    pub fn pointer_move(&mut self, store: &mut TransformStore, input: PointerInput) -> bool {
        let Some(id) = self.owners.get(&input.id) else {
            log::trace!("move for idle pointer {:?} ignored", input.id);
            return false;
        };
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        if let Some(c) = session.contacts.iter_mut().find(|c| c.id == input.id) {
            c.client = input.client;
        }
        if !session.mode.drives(input.id) {
            return false;
        }
        let piece = id.as_str();
        let applied = match session.mode {
            Mode::Idle => return false,
            Mode::Drag { offset, .. } => {
                let pos = session.frame.to_surface(input.client) - offset;
                store.set_position(piece, pos)
            }
            Mode::RotateByHandle { center, .. } => {
                let angle = heading_degrees(center, input.client) + self.handle_bias_deg;
                store.set_rotation(piece, angle)
            }
            Mode::RotateByTwist {
                pointers,
                initial_angle,
                initial_rotation,
            } => match session.twist_angle(pointers) {
                Some(current) => store.set_rotation(piece, initial_rotation + current - initial_angle),
                None => return false,
            },
        };
        applied.is_ok()
    }

    fn lift(&mut self, piece: &PieceId, pointer: PointerId) -> Option<GestureMode> {
        self.owners.remove(&pointer);
        let session = self.sessions.get_mut(piece)?;
        session.contacts.retain(|c| c.id != pointer);
        if session.contacts.is_empty() {
            self.sessions.remove(piece);
            log::debug!("gesture session closed for {piece}");
            return None;
        }
        if session.mode.drives(pointer) {
            session.mode = Mode::Idle;
        }
        Some(session.mode.public())
    }

    /// A pointer lifted or was cancelled by the platform.
    ///
    /// Returns the piece's mode afterwards, `None` once its session has closed.
    /// The piece keeps its last computed transform.
    pub fn pointer_up(&mut self, pointer: PointerId) -> Option<GestureMode> {
        let piece = self.owners.get(&pointer)?.clone();
        self.lift(&piece, pointer)
    }

    /// End every contact on `piece` at once.
    pub fn cancel_piece(&mut self, piece: &str) -> bool {
        if self.sessions.remove(piece).is_none() {
            return false;
        }
        self.owners.retain(|_, owner| owner.as_str() != piece);
        log::debug!("gesture session cancelled for {piece}");
        true
    }

    pub fn release_all(&mut self) {
        self.sessions.clear();
        self.owners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() -> (TransformStore, GestureController) {
        let store = TransformStore::new(&Catalog::bundled().unwrap());
        (store, GestureController::default())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn drag_keeps_grab_offset() {
        let (mut store, mut g) = setup();
        let frame = SurfaceFrame::at(20.0, 30.0);
        store.place_on_board("square", Point::new(100.0, 100.0)).unwrap();
        // surface (110, 105)
        let down = PointerInput::mouse(130.0, 135.0);
        assert_eq!(
            g.pointer_down(&mut store, "square", frame, down).unwrap(),
            GestureMode::Drag
        );
        assert!(g.pointer_move(&mut store, PointerInput::mouse(170.0, 170.0)));
        assert_eq!(store.get("square").unwrap().position, Point::new(140.0, 135.0));
        assert_eq!(g.pointer_up(PointerId(1)), None);
        assert!(!g.is_active("square"));
        assert_eq!(store.get("square").unwrap().position, Point::new(140.0, 135.0));
    }

    #[test]
    fn move_without_gesture_is_noop() {
        let (mut store, mut g) = setup();
        let before = store.views();
        assert!(!g.pointer_move(&mut store, PointerInput::touch(9, 1.0, 1.0)));
        assert_eq!(g.pointer_up(PointerId(9)), None);
        assert_eq!(store.views(), before);
    }

    #[test]
    fn handle_rotation_is_absolute() {
        let (mut store, mut g) = setup();
        let frame = SurfaceFrame::at(0.0, 0.0);
        store.place_on_board("square", Point::new(0.0, 0.0)).unwrap();
        store.set_rotation("square", 200.0).unwrap();
        // centre is (50, 50)
        g.begin_handle_rotation(&mut store, "square", frame, PointerInput::mouse(50.0, 10.0))
            .unwrap();
        assert_eq!(store.get("square").unwrap().rotation_deg, 200.0);
        // straight up reads as 0
        g.pointer_move(&mut store, PointerInput::mouse(50.0, 0.0));
        assert!(close(store.get("square").unwrap().rotation_deg, 0.0));
        // to the right reads as 90
        g.pointer_move(&mut store, PointerInput::mouse(90.0, 50.0));
        assert!(close(store.get("square").unwrap().rotation_deg, 90.0));
        // straight down reads as 180
        g.pointer_move(&mut store, PointerInput::mouse(50.0, 95.0));
        assert!(close(store.get("square").unwrap().rotation_deg, 180.0));
    }

    #[test]
    fn second_finger_switches_to_twist_from_current_rotation() {
        let (mut store, mut g) = setup();
        let frame = SurfaceFrame::default();
        store.place_on_board("square", Point::new(0.0, 0.0)).unwrap();
        store.set_rotation("square", 30.0).unwrap();
        g.pointer_down(&mut store, "square", frame, PointerInput::touch(1, 10.0, 10.0))
            .unwrap();
        g.pointer_move(&mut store, PointerInput::touch(1, 20.0, 10.0));
        assert_eq!(store.get("square").unwrap().position, Point::new(10.0, 0.0));
        store.set_rotation("square", 45.0).unwrap();
        let mode = g
            .pointer_down(&mut store, "square", frame, PointerInput::touch(2, 120.0, 10.0))
            .unwrap();
        assert_eq!(mode, GestureMode::RotateByTwist);
        // no jump when the second finger lands
        assert_eq!(store.get("square").unwrap().rotation_deg, 45.0);
        // finger 2 swings from due east to due south of finger 1
        g.pointer_move(&mut store, PointerInput::touch(2, 20.0, 110.0));
        assert!(close(store.get("square").unwrap().rotation_deg, 135.0));
        // drag is cancelled; position did not follow finger 1
        g.pointer_move(&mut store, PointerInput::touch(1, 25.0, 10.0));
        assert_eq!(store.get("square").unwrap().position, Point::new(10.0, 0.0));
    }

    #[test]
    fn lifting_one_of_two_fingers_does_not_resume_drag() {
        let (mut store, mut g) = setup();
        let frame = SurfaceFrame::default();
        store.place_on_board("square", Point::new(0.0, 0.0)).unwrap();
        g.pointer_down(&mut store, "square", frame, PointerInput::touch(1, 10.0, 10.0))
            .unwrap();
        g.pointer_down(&mut store, "square", frame, PointerInput::touch(2, 30.0, 10.0))
            .unwrap();
        assert_eq!(g.pointer_up(PointerId(2)), Some(GestureMode::Idle));
        let before = store.get("square").unwrap();
        assert!(!g.pointer_move(&mut store, PointerInput::touch(1, 60.0, 60.0)));
        assert_eq!(store.get("square").unwrap(), before);
        assert_eq!(g.pointer_up(PointerId(1)), None);
        assert_eq!(g.active_sessions(), 0);
    }

    #[test]
    fn two_pieces_two_fingers_are_independent() {
        let (mut store, mut g) = setup();
        let frame = SurfaceFrame::default();
        store.place_on_board("square", Point::new(0.0, 0.0)).unwrap();
        store.place_on_board("parallelogram", Point::new(200.0, 0.0)).unwrap();
        g.pointer_down(&mut store, "square", frame, PointerInput::touch(1, 5.0, 5.0))
            .unwrap();
        g.pointer_down(&mut store, "parallelogram", frame, PointerInput::touch(2, 205.0, 5.0))
            .unwrap();
        assert_eq!(g.mode("square"), Some(GestureMode::Drag));
        assert_eq!(g.mode("parallelogram"), Some(GestureMode::Drag));
        g.pointer_move(&mut store, PointerInput::touch(1, 15.0, 5.0));
        g.pointer_move(&mut store, PointerInput::touch(2, 205.0, 25.0));
        assert_eq!(store.get("square").unwrap().position, Point::new(10.0, 0.0));
        assert_eq!(store.get("parallelogram").unwrap().position, Point::new(200.0, 20.0));
        assert!(g.lone_touch_target().is_none());
    }

    #[test]
    fn mouse_plus_second_pointer_does_not_twist() {
        let (mut store, mut g) = setup();
        let frame = SurfaceFrame::default();
        store.place_on_board("square", Point::ORIGIN).unwrap();
        g.pointer_down(&mut store, "square", frame, PointerInput::mouse(5.0, 5.0))
            .unwrap();
        let mode = g
            .pointer_down(&mut store, "square", frame, PointerInput::touch(7, 50.0, 5.0))
            .unwrap();
        assert_eq!(mode, GestureMode::Drag);
    }

    #[test]
    fn unknown_piece_opens_no_session() {
        let (mut store, mut g) = setup();
        let err = g
            .pointer_down(&mut store, "hexagon", SurfaceFrame::default(), PointerInput::mouse(0.0, 0.0))
            .unwrap_err();
        assert_eq!(err.0.as_str(), "hexagon");
        assert_eq!(g.active_sessions(), 0);
        assert!(g.owner(PointerId(1)).is_none());
    }

    struct CountingScope(Rc<Cell<i32>>);

    struct CountingGuard(Rc<Cell<i32>>);

    impl Drop for CountingGuard {
        fn drop(&mut self) {
            self.0.set(self.0.get() - 1);
        }
    }

    impl GestureScope for CountingScope {
        type Guard = CountingGuard;

        fn acquire(&mut self, _piece: &PieceId) -> CountingGuard {
            self.0.set(self.0.get() + 1);
            CountingGuard(self.0.clone())
        }
    }

    #[test]
    fn subscriptions_released_on_every_exit() {
        let live = Rc::new(Cell::new(0));
        let mut store = TransformStore::new(&Catalog::bundled().unwrap());
        let mut g = GestureController::new(CountingScope(live.clone()), HANDLE_BIAS_DEG);
        let frame = SurfaceFrame::default();

        g.pointer_down(&mut store, "square", frame, PointerInput::touch(1, 0.0, 0.0))
            .unwrap();
        g.pointer_down(&mut store, "square", frame, PointerInput::touch(2, 9.0, 0.0))
            .unwrap();
        assert_eq!(live.get(), 1);
        g.pointer_up(PointerId(1));
        g.pointer_up(PointerId(2));
        assert_eq!(live.get(), 0);

        g.pointer_down(&mut store, "square", frame, PointerInput::mouse(0.0, 0.0))
            .unwrap();
        assert!(g.cancel_piece("square"));
        assert_eq!(live.get(), 0);
        assert!(!g.pointer_move(&mut store, PointerInput::mouse(3.0, 3.0)));

        g.pointer_down(&mut store, "square", frame, PointerInput::touch(4, 0.0, 0.0))
            .unwrap();
        g.pointer_down(&mut store, "parallelogram", frame, PointerInput::touch(5, 0.0, 0.0))
            .unwrap();
        assert_eq!(live.get(), 2);
        g.release_all();
        assert_eq!(live.get(), 0);

        g.pointer_down(&mut store, "square", frame, PointerInput::touch(6, 0.0, 0.0))
            .unwrap();
        drop(g);
        assert_eq!(live.get(), 0);
    }
}
