use std::cell::RefCell;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use tangram_core::{PieceView, SessionEvent};

/// Notifications waiting to be handed to JS once the state borrow is released.
#[derive(Default)]
struct Outbox {
    pieces: Option<Vec<PieceView>>,
    events: Vec<SessionEvent>,
    frame_pending: bool,
    on_pieces: Option<Function>,
    on_event: Option<Function>,
}

thread_local! {
    static OUTBOX: RefCell<Outbox> = RefCell::new(Outbox::default());
}

pub fn set_pieces_callback(cb: Option<Function>) {
    OUTBOX.with(|o| o.borrow_mut().on_pieces = cb);
}

pub fn set_event_callback(cb: Option<Function>) {
    OUTBOX.with(|o| o.borrow_mut().on_event = cb);
}

/// Only the latest piece list survives until the next frame.
pub fn queue_pieces(pieces: &[PieceView]) {
    OUTBOX.with(|o| o.borrow_mut().pieces = Some(pieces.to_vec()));
}

pub fn queue_event(event: &SessionEvent) {
    OUTBOX.with(|o| o.borrow_mut().events.push(event.clone()));
}

pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&text)
}

fn call(cb: &Function, value: &impl Serialize) {
    match to_js(value) {
        Ok(v) => {
            if let Err(e) = cb.call1(&JsValue::NULL, &v) {
                log::warn!("callback threw: {e:?}");
            }
        }
        Err(e) => log::warn!("serialize failed: {e:?}"),
    }
}

/// Deliver queued events now and schedule the piece list for the next animation frame.
pub fn flush() {
    let (events, cb) = OUTBOX.with(|o| {
        let mut o = o.borrow_mut();
        (std::mem::take(&mut o.events), o.on_event.clone())
    });
    if let Some(cb) = cb {
        for e in &events {
            call(&cb, e);
        }
    }

    let schedule = OUTBOX.with(|o| {
        let mut o = o.borrow_mut();
        let due = o.pieces.is_some() && !o.frame_pending;
        if due {
            o.frame_pending = true;
        }
        due
    });
    if schedule {
        let frame = Closure::once_into_js(move |_ts: f64| deliver_pieces());
        let requested = web_sys::window()
            .map(|w| w.request_animation_frame(frame.unchecked_ref()).is_ok())
            .unwrap_or(false);
        if !requested {
            deliver_pieces();
        }
    }
}

fn deliver_pieces() {
    let (pieces, cb) = OUTBOX.with(|o| {
        let mut o = o.borrow_mut();
        o.frame_pending = false;
        (o.pieces.take(), o.on_pieces.clone())
    });
    if let (Some(pieces), Some(cb)) = (pieces, cb) {
        call(&cb, &pieces);
    }
}
