//! Diagram type detection
//!
//! Mermaid decides what kind of diagram it is drawing from the first
//! keyword of the source, after front matter, `%%{...}%%` directives and
//! `%%` comments are stripped. The same rule is applied here so containers
//! can be classified without the client-side library.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

/// Diagram families recognized by header keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
    EntityRelationship,
    Gantt,
    Pie,
    Journey,
    GitGraph,
    Mindmap,
    Timeline,
    Quadrant,
    Requirement,
    C4,
    Sankey,
    XyChart,
    Block,
    Packet,
    Architecture,
    Kanban,
    Radar,
    Treemap,
    Info,
}

/// Header keywords per kind, matched against the first token
const KEYWORDS: &[(DiagramKind, &[&str])] = &[
    (
        DiagramKind::Flowchart,
        &["graph", "flowchart", "flowchart-v2", "flowchart-elk"],
    ),
    (DiagramKind::Sequence, &["sequenceDiagram"]),
    (DiagramKind::Class, &["classDiagram", "classDiagram-v2"]),
    (DiagramKind::State, &["stateDiagram", "stateDiagram-v2"]),
    (DiagramKind::EntityRelationship, &["erDiagram"]),
    (DiagramKind::Gantt, &["gantt"]),
    (DiagramKind::Pie, &["pie"]),
    (DiagramKind::Journey, &["journey"]),
    (DiagramKind::GitGraph, &["gitGraph"]),
    (DiagramKind::Mindmap, &["mindmap"]),
    (DiagramKind::Timeline, &["timeline"]),
    (DiagramKind::Quadrant, &["quadrantChart"]),
    (
        DiagramKind::Requirement,
        &["requirement", "requirementDiagram"],
    ),
    (
        DiagramKind::C4,
        &[
            "C4Context",
            "C4Container",
            "C4Component",
            "C4Dynamic",
            "C4Deployment",
        ],
    ),
    (DiagramKind::Sankey, &["sankey", "sankey-beta"]),
    (DiagramKind::XyChart, &["xychart", "xychart-beta"]),
    (DiagramKind::Block, &["block", "block-beta"]),
    (DiagramKind::Packet, &["packet", "packet-beta"]),
    (
        DiagramKind::Architecture,
        &["architecture", "architecture-beta"],
    ),
    (DiagramKind::Kanban, &["kanban"]),
    (DiagramKind::Radar, &["radar-beta"]),
    (DiagramKind::Treemap, &["treemap", "treemap-beta"]),
    (DiagramKind::Info, &["info"]),
];

impl DiagramKind {
    /// Every recognized kind, in detection order
    pub fn all() -> impl Iterator<Item = DiagramKind> {
        KEYWORDS.iter().map(|(kind, _)| *kind)
    }

    /// Identifier written to `data-diagram-type`
    pub fn id(&self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Sequence => "sequence",
            DiagramKind::Class => "class",
            DiagramKind::State => "state",
            DiagramKind::EntityRelationship => "er",
            DiagramKind::Gantt => "gantt",
            DiagramKind::Pie => "pie",
            DiagramKind::Journey => "journey",
            DiagramKind::GitGraph => "gitGraph",
            DiagramKind::Mindmap => "mindmap",
            DiagramKind::Timeline => "timeline",
            DiagramKind::Quadrant => "quadrantChart",
            DiagramKind::Requirement => "requirement",
            DiagramKind::C4 => "c4",
            DiagramKind::Sankey => "sankey",
            DiagramKind::XyChart => "xychart",
            DiagramKind::Block => "block",
            DiagramKind::Packet => "packet",
            DiagramKind::Architecture => "architecture",
            DiagramKind::Kanban => "kanban",
            DiagramKind::Radar => "radar",
            DiagramKind::Treemap => "treemap",
            DiagramKind::Info => "info",
        }
    }

    /// Header keywords that select this kind
    pub fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "Flowcharts with nodes and edges",
            DiagramKind::Sequence => "Message exchanges between participants",
            DiagramKind::Class => "Class structure and relationships",
            DiagramKind::State => "State machines and transitions",
            DiagramKind::EntityRelationship => "Entity relationship models",
            DiagramKind::Gantt => "Project schedules",
            DiagramKind::Pie => "Pie charts",
            DiagramKind::Journey => "User journeys",
            DiagramKind::GitGraph => "Git branch and commit history",
            DiagramKind::Mindmap => "Mind maps",
            DiagramKind::Timeline => "Timelines",
            DiagramKind::Quadrant => "Quadrant charts",
            DiagramKind::Requirement => "Requirement diagrams",
            DiagramKind::C4 => "C4 architecture models",
            DiagramKind::Sankey => "Sankey flow diagrams",
            DiagramKind::XyChart => "XY charts",
            DiagramKind::Block => "Block diagrams",
            DiagramKind::Packet => "Packet layouts",
            DiagramKind::Architecture => "Cloud and service architecture",
            DiagramKind::Kanban => "Kanban boards",
            DiagramKind::Radar => "Radar charts",
            DiagramKind::Treemap => "Treemaps",
            DiagramKind::Info => "Library information",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

fn frontmatter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^-{3}\s*[\n\r](.*?)[\n\r]-{3}\s*[\n\r]+").expect("valid regex")
    })
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)%%\{.*?\}%%").expect("valid regex"))
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*%%.*$").expect("valid regex"))
}

/// Source text with front matter, directives and comments removed
pub fn strip_preamble(source: &str) -> String {
    let source = frontmatter_regex().replace(source, "");
    let source = directive_regex().replace_all(&source, "");
    comment_regex().replace_all(&source, "").into_owned()
}

/// First keyword of the diagram body, if there is one
pub fn header_keyword(source: &str) -> Option<String> {
    let body = strip_preamble(source);
    let token = body
        .split(|c: char| c.is_whitespace() || c == ';')
        .find(|t| !t.is_empty())?;
    Some(token.trim_end_matches(':').to_string())
}

/// Classify diagram source by its header keyword
pub fn detect_diagram_kind(source: &str) -> Option<DiagramKind> {
    trace!(input_len = source.len(), "detect_diagram_kind called");
    let keyword = header_keyword(source)?;
    let kind = KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.contains(&keyword.as_str()))
        .map(|(kind, _)| *kind);
    match kind {
        Some(kind) => debug!(%keyword, %kind, "Detected diagram type"),
        None => debug!(%keyword, "Unrecognized diagram header"),
    }
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flowchart_headers() {
        assert_eq!(
            detect_diagram_kind("graph TD; A-->B;"),
            Some(DiagramKind::Flowchart)
        );
        assert_eq!(
            detect_diagram_kind("flowchart LR\n  A --> B"),
            Some(DiagramKind::Flowchart)
        );
        assert_eq!(
            detect_diagram_kind("graph;A-->B"),
            Some(DiagramKind::Flowchart)
        );
    }

    #[test]
    fn test_other_headers() {
        assert_eq!(
            detect_diagram_kind("sequenceDiagram\n Alice->>Bob: Hi"),
            Some(DiagramKind::Sequence)
        );
        assert_eq!(
            detect_diagram_kind("stateDiagram-v2\n [*] --> Idle"),
            Some(DiagramKind::State)
        );
        assert_eq!(
            detect_diagram_kind("gitGraph:\n commit"),
            Some(DiagramKind::GitGraph)
        );
        assert_eq!(
            detect_diagram_kind("C4Context\n title System"),
            Some(DiagramKind::C4)
        );
        assert_eq!(
            detect_diagram_kind("pie title Pets"),
            Some(DiagramKind::Pie)
        );
    }

    #[test]
    fn test_preamble_is_skipped() {
        let source = "---\ntitle: Worker pool\n---\n%%{init: {'theme': 'dark'}}%%\n%% a comment\n\n  sequenceDiagram\n  A->>B: job";
        assert_eq!(header_keyword(source).as_deref(), Some("sequenceDiagram"));
        assert_eq!(detect_diagram_kind(source), Some(DiagramKind::Sequence));
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(detect_diagram_kind("not a diagram"), None);
        assert_eq!(detect_diagram_kind(""), None);
        assert_eq!(detect_diagram_kind("%% only a comment"), None);
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(detect_diagram_kind("GRAPH TD"), None);
        assert_eq!(detect_diagram_kind("gitgraph"), None);
    }

    #[test]
    fn test_every_kind_has_keywords() {
        for kind in DiagramKind::all() {
            assert!(!kind.keywords().is_empty(), "{} has no keywords", kind);
            assert_eq!(detect_diagram_kind(kind.keywords()[0]), Some(kind));
        }
    }
}
