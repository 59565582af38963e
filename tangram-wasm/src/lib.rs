//! Browser shell for the tangram core: owns the single game session, routes DOM
//! pointer events into it and hands piece lists and session events to JS.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, Window};

use tangram_core::geometry::polygon_points;
use tangram_core::{Catalog, GameConfig, GameSession, Point};

mod input;
mod outbound;
mod state;
mod utils;

use input::DocumentScope;
use outbound::to_js;
use state::{STATE, State, with_state};
use utils::{fetch_catalog_text, init_logging, query_param};

const DEFAULT_SURFACE_ID: &str = "puzzle-area";

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn not_started() -> JsValue {
    JsValue::from_str("tangram runtime not started")
}

fn build_session(
    document: &Document,
    catalog: Catalog,
    config: GameConfig,
) -> Result<GameSession<DocumentScope>, JsValue> {
    let mut session =
        GameSession::with_scope(catalog, config, DocumentScope::new(document.clone()))
            .map_err(js_err)?;
    session.store.subscribe(outbound::queue_pieces);
    session.subscribe(outbound::queue_event);
    Ok(session)
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    init_logging();
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let search = window.location().search().unwrap_or_default();

    let catalog = Catalog::bundled().map_err(js_err)?;
    let mut config = GameConfig::default();
    if let Some(shape) = query_param(&search, "shape")
        && catalog.shape(&shape).is_some()
    {
        config.initial_shape = shape;
    }
    let session = build_session(&document, catalog, config)?;

    let surface = document
        .get_element_by_id(DEFAULT_SURFACE_ID)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok());
    let state = Rc::new(RefCell::new(State {
        document,
        surface: surface.clone(),
        session,
    }));
    STATE.with(|st| st.replace(Some(state)));
    if let Some(surface) = surface {
        input::attach_surface(&surface)?;
    }

    if let Some(name) = query_param(&search, "catalog") {
        let shape = query_param(&search, "shape");
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = load_remote_catalog(&window, &name, shape).await {
                log::warn!("failed to load catalog '{name}': {err:?}");
            }
        });
    }
    log::info!("tangram runtime started");
    Ok(())
}

/// Replace the bundled library once the fetched one arrives; score and completions carry over.
async fn load_remote_catalog(
    window: &Window,
    name: &str,
    shape: Option<String>,
) -> Result<(), JsValue> {
    let text = fetch_catalog_text(window, name).await?;
    let catalog = Catalog::from_json(&text).map_err(js_err)?;
    let shape_id = shape
        .filter(|s| catalog.shape(s).is_some())
        .or_else(|| catalog.shapes().first().map(|s| s.id.clone()))
        .ok_or("catalog has no shapes")?;
    with_session(move |s| s.load_catalog(catalog, &shape_id).map_err(js_err))?;
    log::info!("catalog '{name}' loaded");
    Ok(())
}

/// Use the element with `id` as the puzzle surface.
#[wasm_bindgen]
pub fn attach_surface(id: &str) -> Result<(), JsValue> {
    let surface = with_state(|s| s.document.get_element_by_id(id))
        .ok_or_else(not_started)?
        .ok_or_else(|| JsValue::from_str(&format!("no element #{id}")))?;
    let surface: HtmlElement = surface.dyn_into()?;
    input::attach_surface(&surface)?;
    with_state(|s| s.surface = Some(surface)).ok_or_else(not_started)
}

/// Register the callback receiving the piece list, at most once per animation frame.
#[wasm_bindgen]
pub fn on_pieces(cb: Option<js_sys::Function>) -> Result<(), JsValue> {
    outbound::set_pieces_callback(cb);
    with_state(|s| outbound::queue_pieces(&s.session.store.views())).ok_or_else(not_started)
}

#[wasm_bindgen]
pub fn on_event(cb: Option<js_sys::Function>) {
    outbound::set_event_callback(cb);
}

fn with_session<R>(
    f: impl FnOnce(&mut GameSession<DocumentScope>) -> Result<R, JsValue>,
) -> Result<R, JsValue> {
    with_state(|s| f(&mut s.session)).ok_or_else(not_started)?
}

#[wasm_bindgen]
pub fn move_piece(id: &str, x: f64, y: f64) -> Result<(), JsValue> {
    with_session(|s| s.move_piece(id, Point::new(x, y)).map_err(js_err))
}

#[wasm_bindgen]
pub fn rotate_piece(id: &str, degrees: f64) -> Result<(), JsValue> {
    with_session(|s| s.rotate_piece(id, degrees).map_err(js_err))
}

#[wasm_bindgen]
pub fn rotate_piece_by(id: &str, delta: f64) -> Result<(), JsValue> {
    with_session(|s| s.rotate_piece_by(id, delta).map_err(js_err))
}

#[wasm_bindgen]
pub fn flip_piece(id: &str) -> Result<(), JsValue> {
    with_session(|s| s.flip_piece(id).map_err(js_err))
}

/// Put a palette piece on the board; without coordinates it lands on the drop point.
#[wasm_bindgen]
pub fn place_on_board(id: &str, x: Option<f64>, y: Option<f64>) -> Result<(), JsValue> {
    let at = match (x, y) {
        (Some(x), Some(y)) => Some(Point::new(x, y)),
        _ => None,
    };
    with_session(|s| s.place_on_board(id, at).map_err(js_err))
}

#[wasm_bindgen]
pub fn park_piece(id: &str) -> Result<(), JsValue> {
    with_session(|s| s.park_piece(id).map_err(js_err))
}

#[wasm_bindgen]
pub fn reset_pieces() -> Result<(), JsValue> {
    with_session(|s| {
        s.reset_pieces();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn select_shape(id: &str) -> Result<(), JsValue> {
    with_session(|s| s.select_shape(id).map_err(js_err))
}

/// Pick a random shape the player has not completed yet; returns its id.
#[wasm_bindgen]
pub fn select_random_shape() -> Result<String, JsValue> {
    let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
    let mut rng = SmallRng::seed_from_u64(seed);
    with_session(|s| Ok(s.select_random_shape(&mut rng).id.clone()))
}

#[wasm_bindgen]
pub fn toggle_hint() -> Result<bool, JsValue> {
    with_session(|s| Ok(s.toggle_hint()))
}

#[wasm_bindgen]
pub fn check_solution() -> Result<JsValue, JsValue> {
    with_session(|s| to_js(&s.check_solution()))
}

#[wasm_bindgen]
pub fn snapshot() -> Result<JsValue, JsValue> {
    with_session(|s| to_js(&s.snapshot()))
}

#[wasm_bindgen]
pub fn progress() -> Result<JsValue, JsValue> {
    with_session(|s| to_js(&s.progress()))
}

/// The shape library as JSON, including solution templates for hint rendering.
#[wasm_bindgen]
pub fn shapes() -> Result<JsValue, JsValue> {
    with_session(|s| to_js(&s.catalog().shapes()))
}

#[wasm_bindgen]
pub fn pieces() -> Result<JsValue, JsValue> {
    with_session(|s| to_js(&s.catalog().pieces()))
}

/// Outline of a piece in surface coordinates, as `[[x, y], ...]`.
#[wasm_bindgen]
pub fn world_outline(id: &str) -> Result<JsValue, JsValue> {
    with_session(|s| {
        let poly = s.store.world_outline(id).map_err(js_err)?;
        to_js(&polygon_points(&poly))
    })
}
