use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Document, Element, EventTarget, MouseEvent, PointerEvent};

use tangram_core::{GestureScope, PieceId, PointerId, PointerInput, PointerKind};

use crate::state::{State, with_state};
use crate::utils::{event_client_point, surface_frame};

type PointerClosure = Closure<dyn FnMut(PointerEvent)>;

const DOCUMENT_EVENTS: [&str; 3] = ["pointermove", "pointerup", "pointercancel"];

thread_local! {
    // Closures whose listeners were removed while one of them may still be running.
    static RETIRED: RefCell<Vec<PointerClosure>> = const { RefCell::new(Vec::new()) };
}

/// Document-wide move/up listeners, registered while at least one gesture runs.
pub struct ListenerSet {
    target: EventTarget,
    listeners: Vec<(&'static str, PointerClosure)>,
}

impl ListenerSet {
    fn register(document: &Document) -> Result<ListenerSet, JsValue> {
        let target: EventTarget = document.clone().into();
        let opts = AddEventListenerOptions::new();
        opts.set_passive(false);
        let mut listeners = Vec::with_capacity(DOCUMENT_EVENTS.len());
        for name in DOCUMENT_EVENTS {
            let cb: PointerClosure = Closure::wrap(Box::new(move |e: PointerEvent| {
                if name == "pointermove" {
                    on_document_move(&e);
                } else {
                    on_document_up(&e);
                }
            }));
            target.add_event_listener_with_callback_and_add_event_listener_options(
                name,
                cb.as_ref().unchecked_ref(),
                &opts,
            )?;
            listeners.push((name, cb));
        }
        Ok(ListenerSet { target, listeners })
    }
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        for (name, cb) in self.listeners.drain(..) {
            let _ = self
                .target
                .remove_event_listener_with_callback(name, cb.as_ref().unchecked_ref());
            // may be the closure currently executing; free it on the next acquire
            RETIRED.with(|r| r.borrow_mut().push(cb));
        }
        log::debug!("document pointer listeners removed");
    }
}

/// [`GestureScope`] that keeps the document listeners alive while any gesture
/// session holds a guard. The last guard dropped unregisters them.
pub struct DocumentScope {
    document: Document,
    live: Weak<ListenerSet>,
}

impl DocumentScope {
    pub fn new(document: Document) -> Self {
        DocumentScope {
            document,
            live: Weak::new(),
        }
    }
}

impl GestureScope for DocumentScope {
    type Guard = Option<Rc<ListenerSet>>;

    fn acquire(&mut self, piece: &PieceId) -> Self::Guard {
        RETIRED.with(|r| r.borrow_mut().clear());
        if let Some(set) = self.live.upgrade() {
            return Some(set);
        }
        match ListenerSet::register(&self.document) {
            Ok(set) => {
                let set = Rc::new(set);
                self.live = Rc::downgrade(&set);
                log::debug!("document pointer listeners added for {piece}");
                Some(set)
            }
            Err(e) => {
                log::warn!("could not listen for pointer moves: {e:?}");
                None
            }
        }
    }
}

fn pointer_input(e: &PointerEvent) -> PointerInput {
    let p = event_client_point(e);
    PointerInput::new(
        e.pointer_id(),
        PointerKind::from_pointer_type(&e.pointer_type()),
        p.x,
        p.y,
    )
}

fn on_document_move(e: &PointerEvent) {
    let input = pointer_input(e);
    let consumed = with_state(|s| {
        let session = &mut s.session;
        session.gestures.pointer_move(&mut session.store, input)
    })
    .unwrap_or(false);
    if consumed {
        e.prevent_default();
    }
}

fn on_document_up(e: &PointerEvent) {
    let id = PointerId(e.pointer_id());
    with_state(|s| s.session.gestures.pointer_up(id));
}

fn handle_target(e: &PointerEvent) -> Option<String> {
    let el: Element = e.target()?.dyn_into().ok()?;
    let handle = el.closest("[data-handle]").ok()??;
    handle.get_attribute("data-handle")
}

fn on_surface_down(state: &mut State, e: &PointerEvent) -> bool {
    let Some(surface) = state.surface.clone() else {
        return false;
    };
    let frame = surface_frame(&surface);
    let input = pointer_input(e);
    let session = &mut state.session;

    if let Some(piece) = handle_target(e) {
        return session
            .gestures
            .begin_handle_rotation(&mut session.store, &piece, frame, input)
            .is_ok();
    }

    let hit = session
        .store
        .piece_at(frame.to_surface(input.client))
        .cloned()
        .or_else(|| {
            if input.kind == PointerKind::Touch {
                session.gestures.lone_touch_target().cloned()
            } else {
                None
            }
        });
    match hit {
        Some(piece) => session
            .gestures
            .pointer_down(&mut session.store, piece.as_str(), frame, input)
            .is_ok(),
        None => false,
    }
}

fn on_surface_dblclick(state: &mut State, e: &MouseEvent) {
    let Some(surface) = state.surface.clone() else {
        return;
    };
    let frame = surface_frame(&surface);
    let at = frame.to_surface(event_client_point(e));
    if let Some(piece) = state.session.store.piece_at(at).cloned() {
        let _ = state.session.flip_piece(piece.as_str());
    }
}

/// Wire pointer-down and double-click on the puzzle surface.
pub fn attach_surface(surface: &Element) -> Result<(), JsValue> {
    let down = Closure::<dyn FnMut(PointerEvent)>::wrap(Box::new(move |e: PointerEvent| {
        if with_state(|s| on_surface_down(s, &e)).unwrap_or(false) {
            e.prevent_default();
        }
    }));
    surface.add_event_listener_with_callback("pointerdown", down.as_ref().unchecked_ref())?;
    down.forget();

    let dbl = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
        with_state(|s| on_surface_dblclick(s, &e));
    }));
    surface.add_event_listener_with_callback("dblclick", dbl.as_ref().unchecked_ref())?;
    dbl.forget();
    Ok(())
}
