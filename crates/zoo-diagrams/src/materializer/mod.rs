//! The diagram materializer
//!
//! One run walks a rendered page, swaps every tagged diagram source block
//! for a container holding the raw diagram text, then hands all containers
//! to the diagram engine. A run never fails: an engine that cannot be
//! loaded or that errors while drawing is logged and reported, and the
//! page keeps whatever state it reached.
//!
//! ```rust
//! use futures::executor::block_on;
//! use zoo_diagrams::prelude::*;
//!
//! let mut doc = Document::parse_html(
//!     r#"<pre><code class="language-mermaid">graph TD; A-->B;</code></pre>"#,
//! ).unwrap();
//! let materializer = Materializer::new(EngineProvider::global());
//! let report = block_on(materializer.materialize(Environment::Interactive, &mut doc));
//! assert_eq!(report.converted(), 1);
//! assert!(doc.to_html().starts_with(r#"<div class="mermaid""#));
//! ```

pub mod capability;
pub mod marker;
pub mod page;
pub mod triggers;

pub use capability::EngineProvider;
pub use marker::{MarkerSet, MarkerSpelling};
pub use page::LivePage;
pub use triggers::{install_triggers, Host, NavigationRouter, NavigationSource};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

use crate::core::{Environment, EngineOptions, MaterializeReport, MaterializerConfig};
use crate::dom::{Document, NodeId};
use crate::engine::DiagramEngine;

/// A diagram source block found in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceBlock {
    #[serde(skip)]
    pub node: NodeId,
    pub spelling: MarkerSpelling,
    /// No enclosing `<pre>`; the code node itself will be replaced
    pub inline: bool,
}

/// Converts diagram source blocks into rendered diagram containers
pub struct Materializer {
    config: MaterializerConfig,
    markers: MarkerSet,
    provider: Arc<EngineProvider>,
}

impl Materializer {
    /// Materializer with the default naming convention
    pub fn new(provider: Arc<EngineProvider>) -> Self {
        Self::with_config(MaterializerConfig::default(), provider)
    }

    pub fn with_config(config: MaterializerConfig, provider: Arc<EngineProvider>) -> Self {
        Self {
            markers: MarkerSet::from_config(&config),
            config,
            provider,
        }
    }

    pub fn config(&self) -> &MaterializerConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<EngineProvider> {
        &self.provider
    }

    /// Run the whole pipeline against `document`
    ///
    /// Idempotent: a document holding only containers is left unchanged.
    pub async fn materialize(
        &self,
        environment: Environment,
        document: &mut Document,
    ) -> MaterializeReport {
        let run_span = info_span!("materialize", %environment);
        async {
            match self.prepare(environment).await {
                Ok(engine) => self.apply(engine.as_ref(), document),
                Err(report) => report,
            }
        }
        .instrument(run_span)
        .await
    }

    /// Guard and acquire: the only part of a run that suspends
    ///
    /// Returns the engine to render with, or the report to finish with.
    pub async fn prepare(
        &self,
        environment: Environment,
    ) -> Result<Arc<dyn DiagramEngine>, MaterializeReport> {
        if !environment.is_interactive() {
            debug!("No interactive runtime, skipping");
            return Err(MaterializeReport::Skipped);
        }

        self.provider.acquire().await.map_err(|unavailable| {
            warn!(reason = %unavailable.reason, "Diagram engine not available, page left as-is");
            MaterializeReport::Unavailable {
                reason: unavailable.reason,
            }
        })
    }

    /// Discover, replace, initialize and render; runs without suspending
    pub fn apply(&self, engine: &dyn DiagramEngine, document: &mut Document) -> MaterializeReport {
        let blocks = self.discover(document);
        let converted = self.replace_blocks(document, &blocks);

        engine.initialize(EngineOptions {
            start_on_load: false,
        });

        let containers = document.select_by_class(&self.config.container_class);
        trace!(containers = containers.len(), "Starting render pass");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| engine.run(document, &containers)));
        match outcome {
            Ok(Ok(rendered)) => {
                info!(converted, rendered, "Diagrams materialized");
                MaterializeReport::Rendered {
                    converted,
                    rendered,
                }
            }
            Ok(Err(e)) => {
                error!(engine = engine.name(), error = %e, "Diagram render failed");
                MaterializeReport::RenderFailed {
                    converted,
                    error: e.to_string(),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(engine = engine.name(), %message, "Diagram engine panicked");
                MaterializeReport::RenderFailed {
                    converted,
                    error: message,
                }
            }
        }
    }

    /// All attached source blocks, in document order
    pub fn discover(&self, document: &Document) -> Vec<SourceBlock> {
        let blocks: Vec<SourceBlock> = document
            .select(|_, el| self.markers.classify(el).is_some())
            .into_iter()
            .filter_map(|node| {
                let spelling = self.markers.classify(document.element(node)?)?;
                Some(SourceBlock {
                    node,
                    spelling,
                    inline: document.closest(node, "pre").is_none(),
                })
            })
            .collect();
        debug!(found = blocks.len(), "Discovered diagram source blocks");
        blocks
    }

    /// Swap each block (or its enclosing `<pre>`) for a container
    ///
    /// A `<pre>` without a parent cannot be swapped, so the block itself is
    /// replaced inside it. Blocks with no parent at all, and blocks inside a
    /// subtree this pass already replaced, are left alone. Returns the
    /// number of containers inserted.
    pub fn replace_blocks(&self, document: &mut Document, blocks: &[SourceBlock]) -> usize {
        let mut replaced: Vec<NodeId> = Vec::new();
        for block in blocks {
            let inside_replaced = std::iter::once(block.node)
                .chain(document.ancestors(block.node))
                .any(|n| replaced.contains(&n));
            if inside_replaced {
                trace!(node = %block.node, "Block already replaced with an ancestor");
                continue;
            }

            let target = match document
                .closest(block.node, "pre")
                .filter(|&pre| document.parent(pre).is_some())
            {
                Some(pre) => pre,
                None if document.parent(block.node).is_some() => block.node,
                None => {
                    trace!(node = %block.node, "Block has no parent, left alone");
                    continue;
                }
            };

            let source = document.text_content(block.node);
            let container = self.create_container(document, &source);
            match document.replace_node(target, container) {
                Ok(()) => {
                    replaced.push(target);
                    trace!(node = %block.node, %container, spelling = %block.spelling, "Replaced source block");
                }
                Err(e) => warn!(node = %block.node, error = %e, "Could not replace source block"),
            }
        }
        replaced.len()
    }

    fn create_container(&self, document: &mut Document, source: &str) -> NodeId {
        let container = document.create_element(self.config.container_tag.as_str());
        if let Some(el) = document.element_mut(container) {
            el.set_attribute("class", self.config.container_class.as_str());
        }
        // A fresh element always accepts text.
        let _ = document.set_text_content(container, source);
        container
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "diagram engine panicked".to_string()
    }
}
