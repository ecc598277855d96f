//! WebAssembly bindings for zoo-diagrams
//!
//! Exposes the materializer to page scripts. The page keeps ownership of
//! its navigation hooks and calls into these functions from them.

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::core::{Environment, MaterializerConfig};
use crate::engine::PrerenderLoader;
use crate::materializer::{EngineProvider, Materializer};

/// Initialize WASM module
///
/// Sets up panic hooks and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use crate::core::logging::init_logging;
    let _ = init_logging(Some("info"), None);
}

/// Materialize diagram blocks in an HTML fragment
///
/// Resolves to the updated HTML. Rejects only when the HTML cannot be
/// parsed; engine problems leave the fragment unchanged.
#[wasm_bindgen]
pub async fn materialize_html(html: String) -> Result<String, JsValue> {
    crate::materialize_html(&html)
        .await
        .map(|(output, _)| output)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Like [`materialize_html`], with a JSON config and a JSON report
///
/// Resolves to `{"html": ..., "report": {...}}`.
#[wasm_bindgen]
pub async fn materialize_html_json(html: String, config_json: String) -> Result<String, JsValue> {
    let config = if config_json.trim().is_empty() {
        MaterializerConfig::default()
    } else {
        MaterializerConfig::from_json(&config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    let provider = if config.id_prefix == MaterializerConfig::default().id_prefix {
        EngineProvider::global()
    } else {
        Arc::new(EngineProvider::new(PrerenderLoader::new(config.id_prefix.clone())))
    };
    let materializer = Materializer::with_config(config, provider);
    let (output, report) =
        crate::materialize_html_with(&materializer, Environment::Interactive, &html)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(serde_json::json!({
        "html": output,
        "report": report,
    })
    .to_string())
}
