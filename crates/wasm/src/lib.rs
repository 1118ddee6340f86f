use std::cell::RefCell;

use danmaku_core::parsers::{DanmakuFile, parse_danmaku};
use danmaku_core::views::render_overlay;
use danmaku_core::{Engine, MonospaceMeasurer, Phase};
use danmaku_protocol::Viewport;
use serde::Serialize;
use wasm_bindgen::prelude::*;

type HostEngine = Engine<MonospaceMeasurer>;

thread_local! {
    /// Engine slab; a handle is an index, freed slots stay `None`.
    static ENGINES: RefCell<Vec<Option<HostEngine>>> = const { RefCell::new(Vec::new()) };
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn with_engine<T>(handle: usize, f: impl FnOnce(&mut HostEngine) -> T) -> Result<T, JsError> {
    ENGINES.with(|engines| {
        let mut engines = engines.borrow_mut();
        let engine = engines
            .get_mut(handle)
            .and_then(Option::as_mut)
            .ok_or_else(|| JsError::new("invalid engine handle"))?;
        Ok(f(engine))
    })
}

/// Parse a comment file (JSON) and start playback at `now` (ms on the host
/// clock). Returns a handle for later calls.
#[wasm_bindgen]
pub fn create_engine(json: &str, now: f64) -> Result<usize, JsError> {
    let DanmakuFile { config, danmus } = parse_danmaku(json.as_bytes()).map_err(js_err)?;
    let mut engine = Engine::new(config, danmus, MonospaceMeasurer::default()).map_err(js_err)?;
    engine.start(now);

    Ok(ENGINES.with(|engines| {
        let mut engines = engines.borrow_mut();
        match engines.iter().position(Option::is_none) {
            Some(free) => {
                engines[free] = Some(engine);
                free
            }
            None => {
                engines.push(Some(engine));
                engines.len() - 1
            }
        }
    }))
}

/// Fire every timer due at or before `now`, returning the events as JSON.
#[wasm_bindgen]
pub fn advance(handle: usize, now: f64) -> Result<String, JsError> {
    let events = with_engine(handle, |engine| engine.advance(now))?;
    serde_json::to_string(&events).map_err(js_err)
}

/// Render commands for the overlay at `now`, as JSON.
#[wasm_bindgen]
pub fn render(handle: usize, now: f64) -> Result<String, JsError> {
    let commands = with_engine(handle, |engine| {
        let viewport = Viewport::new(engine.config().container_width, engine.overlay_height());
        render_overlay(engine, &viewport, now)
    })?;
    serde_json::to_string(&commands).map_err(js_err)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EngineStats {
    phase: Phase,
    lane_count: usize,
    width: f64,
    height: f64,
    active: usize,
    pending: usize,
    quiescent: bool,
}

/// Overlay size and playback counters as JSON.
#[wasm_bindgen]
pub fn engine_stats(handle: usize) -> Result<String, JsError> {
    let stats = with_engine(handle, |engine| EngineStats {
        phase: engine.phase(),
        lane_count: engine.lane_count(),
        width: engine.config().container_width,
        height: engine.overlay_height(),
        active: engine.active().len(),
        pending: engine.pending_count(),
        quiescent: engine.is_quiescent(),
    })?;
    serde_json::to_string(&stats).map_err(js_err)
}

/// Stop the engine and free its handle. Unknown handles are ignored.
#[wasm_bindgen]
pub fn destroy(handle: usize) {
    ENGINES.with(|engines| {
        if let Some(slot) = engines.borrow_mut().get_mut(handle)
            && let Some(mut engine) = slot.take()
        {
            engine.stop();
            log::info!("engine {handle} destroyed");
        }
    });
}
