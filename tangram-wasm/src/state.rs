use std::cell::RefCell;
use std::rc::Rc;

use web_sys::{Document, HtmlElement};

use tangram_core::GameSession;

use crate::input::DocumentScope;

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
pub struct State {
    pub document: Document,
    /// Element whose top-left corner is the origin of piece positions.
    pub surface: Option<HtmlElement>,
    pub session: GameSession<DocumentScope>,
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}

/// Run `f` against the runtime state, then deliver whatever it queued for JS.
///
/// Returns `None` before start-up and when called re-entrantly from inside a
/// callback that already holds the state.
pub fn with_state<R>(f: impl FnOnce(&mut State) -> R) -> Option<R> {
    let rc = STATE.with(|st| st.borrow().clone())?;
    let out = match rc.try_borrow_mut() {
        Ok(mut s) => f(&mut s),
        Err(_) => {
            log::warn!("state busy; call ignored");
            return None;
        }
    };
    crate::outbound::flush();
    Some(out)
}
