//! Naming convention for diagram source blocks
//!
//! Markdown renderers tag fenced blocks with a language class. Two
//! spellings of that class are in circulation for diagram blocks, and both
//! are accepted anywhere inside a class token, so `language-mermaidjs` and
//! `xlang-mermaid` are diagram blocks too. Comparison ignores ASCII case and
//! treats `-`, `_` and `:` as the same separator, so `Language_Mermaid`
//! matches `language-mermaid`.

use std::fmt;

use serde::Serialize;

use crate::core::MaterializerConfig;
use crate::dom::ElementData;

/// Which accepted spelling tagged a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSpelling {
    Primary,
    Legacy,
}

impl fmt::Display for MarkerSpelling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerSpelling::Primary => write!(f, "primary"),
            MarkerSpelling::Legacy => write!(f, "legacy"),
        }
    }
}

/// Elements that may carry a diagram marker
const MARKABLE_ELEMENTS: [&str; 2] = ["code", "pre"];

fn normalize(token: &str) -> String {
    token
        .chars()
        .map(|c| match c {
            '_' | ':' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// The two accepted marker spellings, pre-normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    primary: String,
    legacy: String,
}

impl MarkerSet {
    pub fn new(primary: &str, legacy: &str) -> Self {
        Self {
            primary: normalize(primary),
            legacy: normalize(legacy),
        }
    }

    pub fn from_config(config: &MaterializerConfig) -> Self {
        Self::new(&config.primary_marker, &config.legacy_marker)
    }

    /// Match a single class token containing a marker
    pub fn match_token(&self, token: &str) -> Option<MarkerSpelling> {
        let token = normalize(token);
        if token.contains(&self.primary) {
            Some(MarkerSpelling::Primary)
        } else if token.contains(&self.legacy) {
            Some(MarkerSpelling::Legacy)
        } else {
            None
        }
    }

    /// Match an element: a `code` or `pre` with a marker class token
    pub fn classify(&self, element: &ElementData) -> Option<MarkerSpelling> {
        if !MARKABLE_ELEMENTS.contains(&element.name.as_str()) {
            return None;
        }
        element.classes().find_map(|token| self.match_token(token))
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::from_config(&MaterializerConfig::default())
    }
}
