//! Core error types for diagram materialization
//!
//! Nothing defined here ever escapes [`crate::Materializer::materialize`];
//! the materializer turns every failure into a log line and a report.

use std::fmt;

use thiserror::Error;

/// Core error types for document and diagram processing
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("Unknown diagram type: {diagram_type}")]
    UnknownDiagramType { diagram_type: String },

    #[error("Diagram engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    #[error("Document error: {message}")]
    DomError { message: String },

    #[error("Config error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl DiagramError {
    /// Create a new parse error
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render_error(message: impl Into<String>) -> Self {
        Self::RenderError {
            message: message.into(),
        }
    }

    /// Create a new unknown diagram type error
    pub fn unknown_diagram_type(diagram_type: impl Into<String>) -> Self {
        Self::UnknownDiagramType {
            diagram_type: diagram_type.into(),
        }
    }

    /// Create a new engine unavailable error
    pub fn engine_unavailable(reason: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a new document error
    pub fn dom_error(message: impl Into<String>) -> Self {
        Self::DomError {
            message: message.into(),
        }
    }

    /// Create a new config error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

/// The diagram engine could not be acquired for this run.
///
/// Returned as data by the capability provider so that call sites decide
/// what to do with it instead of unwinding through the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable {
    pub reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diagram engine unavailable: {}", self.reason)
    }
}

impl From<DiagramError> for Unavailable {
    fn from(error: DiagramError) -> Self {
        match error {
            DiagramError::EngineUnavailable { reason } => Self { reason },
            other => Self {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let error = DiagramError::parse_error("unexpected end of input");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Parse error"));
        assert!(error_msg.contains("unexpected end of input"));
    }

    #[test]
    fn test_render_error() {
        let error = DiagramError::render_error("Render failed");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Render error"));
        assert!(error_msg.contains("Render failed"));
    }

    #[test]
    fn test_unknown_diagram_type() {
        let error = DiagramError::unknown_diagram_type("wibble");
        assert_eq!(error.to_string(), "Unknown diagram type: wibble");
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io;
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: DiagramError = io_err.into();
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("IO error"));
        assert!(error_msg.contains("File not found"));
    }

    #[test]
    fn test_unavailable_from_engine_error_keeps_reason() {
        let unavailable: Unavailable = DiagramError::engine_unavailable("offline").into();
        assert_eq!(unavailable.reason, "offline");
        assert_eq!(unavailable.to_string(), "diagram engine unavailable: offline");
    }

    #[test]
    fn test_unavailable_from_other_error_uses_message() {
        let unavailable: Unavailable = DiagramError::render_error("boom").into();
        assert_eq!(unavailable.reason, "Render error: boom");
    }
}
