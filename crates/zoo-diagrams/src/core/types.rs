//! Value types shared by the materializer, engines and hosts

use std::fmt;

use serde::Serialize;

/// Where a materializer run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Environment {
    /// A live page with a display to draw into
    #[default]
    Interactive,
    /// Static generation; there is nothing to draw into
    Static,
}

impl Environment {
    pub fn is_interactive(&self) -> bool {
        matches!(self, Environment::Interactive)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Interactive => write!(f, "interactive"),
            Environment::Static => write!(f, "static"),
        }
    }
}

/// Options passed to a diagram engine before a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineOptions {
    /// Render every container as soon as the engine loads
    pub start_on_load: bool,
}

/// What a single materializer run did
///
/// Purely informational. Every variant is a normal completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MaterializeReport {
    /// No interactive runtime; nothing was touched
    Skipped,
    /// The engine could not be acquired; nothing was touched
    Unavailable { reason: String },
    /// Every container was handed to the engine successfully
    Rendered { converted: usize, rendered: usize },
    /// Source blocks were converted but the render pass failed
    RenderFailed { converted: usize, error: String },
}

impl MaterializeReport {
    /// Number of source blocks replaced during the run
    pub fn converted(&self) -> usize {
        match self {
            MaterializeReport::Rendered { converted, .. }
            | MaterializeReport::RenderFailed { converted, .. } => *converted,
            MaterializeReport::Skipped | MaterializeReport::Unavailable { .. } => 0,
        }
    }

    /// True if the run left the document untouched
    ///
    /// A render pass may mark existing containers even when no block was
    /// converted, and a failed pass may have marked some before failing.
    pub fn is_noop(&self) -> bool {
        match self {
            MaterializeReport::Skipped | MaterializeReport::Unavailable { .. } => true,
            MaterializeReport::Rendered {
                converted,
                rendered,
            } => *converted == 0 && *rendered == 0,
            MaterializeReport::RenderFailed { .. } => false,
        }
    }
}

impl fmt::Display for MaterializeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeReport::Skipped => write!(f, "skipped (no interactive runtime)"),
            MaterializeReport::Unavailable { reason } => {
                write!(f, "diagram engine unavailable: {}", reason)
            }
            MaterializeReport::Rendered {
                converted,
                rendered,
            } => write!(f, "converted {} block(s), rendered {}", converted, rendered),
            MaterializeReport::RenderFailed { converted, error } => {
                write!(f, "converted {} block(s), render failed: {}", converted, error)
            }
        }
    }
}
