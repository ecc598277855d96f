//! Tests for logging functionality
//!
//! Initialization is checked for every level and format. The capture tests
//! install a thread-local subscriber and assert on what a materializer run
//! actually reports, since failures surface only as log lines.

use std::io;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use futures::executor::block_on;
use futures::future::{self, BoxFuture, FutureExt};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use zoo_diagrams::core::logging::{init_logging, LogFormat};
use zoo_diagrams::prelude::*;

#[test]
fn test_log_format_parsing() {
    assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
    assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
    assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
    assert_eq!(LogFormat::from_str("COMPACT").unwrap(), LogFormat::Compact);
    assert!(LogFormat::from_str("invalid").is_err());
}

#[test]
fn test_init_logging_with_levels() {
    // Only the first call installs a subscriber; the rest must not panic.
    let _ = init_logging(Some("trace"), Some("compact"));
    let _ = init_logging(Some("debug"), Some("compact"));
    let _ = init_logging(Some("warn"), Some("pretty"));
    let _ = init_logging(Some("off"), Some("json"));
    let _ = init_logging(None, None);
}

#[test]
fn test_init_logging_invalid_format() {
    let result = init_logging(Some("info"), Some("invalid_format"));
    assert!(result.is_err());
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
    let captured = Captured::default();
    let guard = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .set_default();
    let value = f();
    drop(guard);
    (value, captured.contents())
}

struct OfflineLoader;

impl EngineLoader for OfflineLoader {
    fn load(&self) -> BoxFuture<'_, Result<std::sync::Arc<dyn DiagramEngine>, DiagramError>> {
        future::ready(Err(DiagramError::engine_unavailable("network down"))).boxed()
    }
}

#[test]
fn test_unavailable_engine_is_logged_as_warning() {
    let m = Materializer::new(Arc::new(EngineProvider::new(OfflineLoader)));
    let mut doc =
        Document::parse_html(r#"<code class="language-mermaid">graph TD</code>"#).unwrap();

    let (report, logs) =
        capture(|| block_on(m.materialize(Environment::Interactive, &mut doc)));

    assert!(matches!(report, MaterializeReport::Unavailable { .. }));
    assert!(logs.contains("WARN"), "logs: {}", logs);
    assert!(logs.contains("network down"), "logs: {}", logs);
}

#[test]
fn test_render_failure_is_logged_as_error() {
    let m = Materializer::new(Arc::new(EngineProvider::new(PrerenderLoader::default())));
    let mut doc =
        Document::parse_html(r#"<code class="language-mermaid">notADiagram</code>"#).unwrap();

    let (report, logs) =
        capture(|| block_on(m.materialize(Environment::Interactive, &mut doc)));

    assert!(matches!(report, MaterializeReport::RenderFailed { .. }));
    assert!(logs.contains("ERROR"), "logs: {}", logs);
    assert!(logs.contains("notADiagram"), "logs: {}", logs);
}

#[test]
fn test_successful_run_reports_counts() {
    let m = Materializer::new(Arc::new(EngineProvider::new(PrerenderLoader::default())));
    let mut doc = Document::parse_html(
        r#"<pre><code class="lang-mermaid">classDiagram</code></pre>"#,
    )
    .unwrap();

    let (_, logs) = capture(|| block_on(m.materialize(Environment::Interactive, &mut doc)));

    assert!(logs.contains("Diagrams materialized"), "logs: {}", logs);
    assert!(logs.contains("converted=1"), "logs: {}", logs);
    assert!(!logs.contains("ERROR"), "logs: {}", logs);
}
