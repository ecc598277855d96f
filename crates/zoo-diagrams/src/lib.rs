//! zoo-diagrams - diagram materialization for the Zoo Framework docs
//!
//! Rendered documentation pages carry Mermaid diagrams as fenced code
//! blocks. This crate finds those blocks, replaces each with a diagram
//! container holding the raw source, and hands the containers to a diagram
//! engine, re-running after every in-app navigation.
//!
//! # Quick Start
//!
//! ```rust
//! use zoo_diagrams::materialize_html;
//!
//! let html = r#"<pre><code class="language-mermaid">graph TD; A-->B;</code></pre>"#;
//! let (output, report) = futures::executor::block_on(materialize_html(html)).unwrap();
//! assert_eq!(report.converted(), 1);
//! assert!(output.contains(r#"data-diagram-type="flowchart""#));
//! ```
//!
//! # Advanced Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use futures::executor::block_on;
//! use zoo_diagrams::prelude::*;
//!
//! let config = MaterializerConfig::from_json(r#"{"container_class": "diagram"}"#).unwrap();
//! let provider = Arc::new(EngineProvider::new(PrerenderLoader::new("fig")));
//! let materializer = Materializer::with_config(config, provider);
//!
//! let mut doc = Document::parse_html(r#"<p><code class="lang-mermaid">pie</code></p>"#).unwrap();
//! block_on(materializer.materialize(Environment::Interactive, &mut doc));
//! assert_eq!(doc.select_by_class("diagram").len(), 1);
//! ```

pub mod core;
pub mod dom;
pub mod engine;
pub mod materializer;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use crate::core::*;
pub use crate::dom::{Document, NodeId};
pub use crate::materializer::{Materializer, SourceBlock};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        DiagramError, EngineOptions, Environment, MaterializeReport, MaterializerConfig,
        Unavailable,
    };
    pub use crate::dom::{Document, ElementData, NodeData, NodeId};
    pub use crate::engine::{
        detect_diagram_kind, DiagramEngine, DiagramKind, EngineLoader, PrerenderEngine,
        PrerenderLoader,
    };
    pub use crate::materializer::{
        install_triggers, EngineProvider, Host, LivePage, MarkerSet, MarkerSpelling,
        Materializer, NavigationRouter, NavigationSource, SourceBlock,
    };
}

/// Materialize diagrams in an HTML page with the default configuration
///
/// Uses the process-wide engine provider. The HTML is returned unchanged,
/// byte for byte, when the run leaves the document structurally unchanged.
/// A page without source blocks can still change: containers already in it
/// that the engine has not processed yet are rendered.
pub async fn materialize_html(html: &str) -> anyhow::Result<(String, MaterializeReport)> {
    let materializer = Materializer::new(materializer::EngineProvider::global());
    materialize_html_with(&materializer, Environment::Interactive, html).await
}

/// Materialize diagrams in an HTML page with a given materializer
pub async fn materialize_html_with(
    materializer: &Materializer,
    environment: Environment,
    html: &str,
) -> anyhow::Result<(String, MaterializeReport)> {
    let mut document = Document::parse_html(html)?;
    let before = document.clone();
    let report = materializer.materialize(environment, &mut document).await;
    let output = if document == before {
        html.to_string()
    } else {
        document.to_html()
    };
    Ok((output, report))
}
