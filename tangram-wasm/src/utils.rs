use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, Response, Window};

use tangram_core::{Point, SurfaceFrame};

/// Route the `log` facade to the browser console.
pub fn init_logging() {
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    wasm_logger::init(wasm_logger::Config::new(level));
}

/// Client-space placement of the puzzle surface as it is laid out right now.
pub fn surface_frame(surface: &Element) -> SurfaceFrame {
    let rect = surface.get_bounding_client_rect();
    SurfaceFrame::at(rect.left(), rect.top())
}

pub fn event_client_point(e: &web_sys::MouseEvent) -> Point {
    Point::new(e.client_x() as f64, e.client_y() as f64)
}

fn catalog_url(name: &str) -> String {
    if name.contains("://") || name.ends_with(".json") {
        name.to_string()
    } else {
        format!("catalog/{name}.json")
    }
}

/// Fetch a catalog by bare name (`catalog/<name>.json`, relative to the page) or by URL.
pub async fn fetch_catalog_text(window: &Window, name: &str) -> Result<String, JsValue> {
    let url = catalog_url(name);
    let resp: Response = JsFuture::from(window.fetch_with_str(&url))
        .await?
        .dyn_into()?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!("GET {url}: HTTP {}", resp.status())));
    }
    JsFuture::from(resp.text()?)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str("catalog body is not text"))
}

/// Value of `key` in a `?a=b&c=d` query string, percent-decoded.
pub fn query_param(search: &str, key: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| {
            percent_encoding::percent_decode_str(&v.replace('+', " "))
                .decode_utf8_lossy()
                .into_owned()
        })
}
