//! Built-in engine that prepares containers for client-side drawing
//!
//! It does what the browser library does before it draws: classify each
//! container by its header, give it a stable id, and mark it processed so
//! later passes leave it alone. Containers whose type cannot be determined
//! fail the pass, like a syntax error would in the browser.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, info, span, trace, warn, Level};

use super::{detect_diagram_kind, header_keyword, DiagramEngine, EngineLoader};
use crate::core::{DiagramError, EngineOptions};
use crate::dom::{Document, NodeId};

/// Attribute set on containers the engine has handled
pub const PROCESSED_ATTR: &str = "data-processed";

/// Attribute carrying the detected diagram type
pub const DIAGRAM_TYPE_ATTR: &str = "data-diagram-type";

/// Classifying engine used outside the browser
#[derive(Debug)]
pub struct PrerenderEngine {
    id_prefix: String,
    start_on_load: AtomicBool,
    next_id: AtomicUsize,
}

impl PrerenderEngine {
    pub fn new() -> Self {
        Self::with_id_prefix("mermaid")
    }

    pub fn with_id_prefix(prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: prefix.into(),
            start_on_load: AtomicBool::new(true),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Whether the last `initialize` asked for rendering on load
    pub fn start_on_load(&self) -> bool {
        self.start_on_load.load(Ordering::Relaxed)
    }

    fn render_one(&self, document: &mut Document, container: NodeId) -> Result<bool, DiagramError> {
        if document.attribute(container, PROCESSED_ATTR).is_some() {
            trace!(%container, "Container already processed");
            return Ok(false);
        }

        let source = document.text_content(container);
        let kind = detect_diagram_kind(&source).ok_or_else(|| {
            DiagramError::unknown_diagram_type(
                header_keyword(&source).unwrap_or_else(|| "<empty>".to_string()),
            )
        })?;

        if document.attribute(container, "id").is_none() {
            let n = self.next_id.fetch_add(1, Ordering::Relaxed);
            document.set_attribute(container, "id", format!("{}-{}", self.id_prefix, n))?;
        }
        document.set_attribute(container, DIAGRAM_TYPE_ATTR, kind.id())?;
        document.set_attribute(container, PROCESSED_ATTR, "true")?;
        debug!(%container, %kind, "Rendered container");
        Ok(true)
    }
}

impl Default for PrerenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramEngine for PrerenderEngine {
    fn name(&self) -> &'static str {
        "prerender"
    }

    fn initialize(&self, options: EngineOptions) {
        self.start_on_load
            .store(options.start_on_load, Ordering::Relaxed);
    }

    fn run(&self, document: &mut Document, containers: &[NodeId]) -> Result<usize, DiagramError> {
        let run_span = span!(Level::INFO, "prerender_run", containers = containers.len());
        let _enter = run_span.enter();

        let mut rendered = 0;
        let mut first_error = None;
        for &container in containers {
            match self.render_one(document, container) {
                Ok(true) => rendered += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(%container, error = %e, "Container could not be rendered");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(rendered, "Render pass completed");
                Ok(rendered)
            }
        }
    }
}

/// Loader for [`PrerenderEngine`]; never fails
#[derive(Debug, Clone)]
pub struct PrerenderLoader {
    id_prefix: String,
}

impl PrerenderLoader {
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
        }
    }
}

impl Default for PrerenderLoader {
    fn default() -> Self {
        Self::new("mermaid")
    }
}

impl EngineLoader for PrerenderLoader {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn DiagramEngine>, DiagramError>> {
        let engine: Arc<dyn DiagramEngine> =
            Arc::new(PrerenderEngine::with_id_prefix(self.id_prefix.clone()));
        future::ready(Ok(engine)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(doc: &mut Document, text: &str) -> NodeId {
        let div = doc.create_element("div");
        doc.append_child(doc.root(), div).unwrap();
        doc.set_attribute(div, "class", "mermaid").unwrap();
        doc.set_text_content(div, text).unwrap();
        div
    }

    #[test]
    fn test_marks_containers_processed() {
        let mut doc = Document::new();
        let a = container(&mut doc, "graph TD; A-->B;");
        let b = container(&mut doc, "sequenceDiagram\nA->>B: hi");

        let engine = PrerenderEngine::new();
        let rendered = engine.run(&mut doc, &[a, b]).unwrap();

        assert_eq!(rendered, 2);
        assert_eq!(doc.attribute(a, PROCESSED_ATTR), Some("true"));
        assert_eq!(doc.attribute(a, DIAGRAM_TYPE_ATTR), Some("flowchart"));
        assert_eq!(doc.attribute(a, "id"), Some("mermaid-0"));
        assert_eq!(doc.attribute(b, DIAGRAM_TYPE_ATTR), Some("sequence"));
        assert_eq!(doc.attribute(b, "id"), Some("mermaid-1"));
        assert_eq!(doc.text_content(a), "graph TD; A-->B;");
    }

    #[test]
    fn test_second_pass_skips_processed() {
        let mut doc = Document::new();
        let a = container(&mut doc, "pie title Pets");
        let engine = PrerenderEngine::new();
        assert_eq!(engine.run(&mut doc, &[a]).unwrap(), 1);
        let snapshot = doc.clone();
        assert_eq!(engine.run(&mut doc, &[a]).unwrap(), 0);
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn test_unknown_type_fails_after_visiting_all() {
        let mut doc = Document::new();
        let bad = container(&mut doc, "nonsense here");
        let good = container(&mut doc, "gantt\n title Plan");

        let engine = PrerenderEngine::new();
        let result = engine.run(&mut doc, &[bad, good]);

        match result {
            Err(DiagramError::UnknownDiagramType { diagram_type }) => {
                assert_eq!(diagram_type, "nonsense")
            }
            other => panic!("Expected UnknownDiagramType, got {:?}", other),
        }
        assert_eq!(doc.attribute(bad, PROCESSED_ATTR), None);
        assert_eq!(doc.attribute(good, PROCESSED_ATTR), Some("true"));
    }

    #[test]
    fn test_existing_id_is_kept() {
        let mut doc = Document::new();
        let a = container(&mut doc, "mindmap\n root");
        doc.set_attribute(a, "id", "worker-map").unwrap();
        PrerenderEngine::new().run(&mut doc, &[a]).unwrap();
        assert_eq!(doc.attribute(a, "id"), Some("worker-map"));
    }

    #[test]
    fn test_initialize_records_options() {
        let engine = PrerenderEngine::new();
        assert!(engine.start_on_load());
        engine.initialize(EngineOptions {
            start_on_load: false,
        });
        assert!(!engine.start_on_load());
    }

    #[test]
    fn test_loader_yields_engine() {
        let engine = futures::executor::block_on(PrerenderLoader::new("zoo").load()).unwrap();
        assert_eq!(engine.name(), "prerender");
        let mut doc = Document::new();
        let a = container(&mut doc, "journey\n title Day");
        engine.run(&mut doc, &[a]).unwrap();
        assert_eq!(doc.attribute(a, "id"), Some("zoo-0"));
    }
}
