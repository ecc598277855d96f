//! HTML parsing and serialization for [`Document`]
//!
//! Parsing drives `lol_html` over the input and rebuilds a tree from its
//! token stream. `lol_html` does not run the full HTML tree-construction
//! algorithm, so a few implied end tags are handled here; rendered
//! documentation pages are well-formed enough for that to suffice.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::{EndTag, TextType};
use lol_html::{doc_comments, doc_text, doctype, element, HtmlRewriter, Settings};
use tracing::{debug, span, trace, Level};

use super::{Attribute, Document, ElementData, NodeData, NodeId};
use crate::core::DiagramError;

/// Elements that never have children or an end tag
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text is written out verbatim
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Elements closed by an opening sibling of the same name
const SELF_TERMINATING: [&str; 8] = ["p", "li", "dt", "dd", "option", "tr", "td", "th"];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[derive(Default)]
struct TreeBuilder {
    document: Document,
    open: Vec<NodeId>,
    pending_text: String,
    pending_decode: bool,
    error: Option<DiagramError>,
}

impl TreeBuilder {
    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or_else(|| self.document.root())
    }

    fn attach(&mut self, node: NodeId) {
        let parent = self.current();
        if let Err(e) = self.document.append_child(parent, node) {
            self.error.get_or_insert(e);
        }
    }

    fn push_text(&mut self, chunk: &str, decode: bool) {
        self.pending_decode = decode;
        self.pending_text.push_str(chunk);
    }

    /// Text chunks may split an entity, so decoding waits for the whole run
    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.pending_text);
        let text = if self.pending_decode {
            htmlize::unescape(&raw).into_owned()
        } else {
            raw
        };
        let node = self.document.create_text(text);
        self.attach(node);
    }

    fn open_element(&mut self, data: ElementData, has_end_tag: bool) -> NodeId {
        self.flush_text();
        let current = self.current();
        if SELF_TERMINATING.contains(&data.name.as_str())
            && self.document.tag_name(current) == Some(data.name.as_str())
        {
            trace!(tag = %data.name, "implied end tag");
            self.close(current);
        }
        let node = self.document.create_element_with(data);
        self.attach(node);
        if has_end_tag {
            self.open.push(node);
        }
        node
    }

    fn close(&mut self, node: NodeId) {
        self.flush_text();
        if let Some(pos) = self.open.iter().rposition(|&n| n == node) {
            self.open.truncate(pos);
        }
    }

    fn comment(&mut self, text: String) {
        self.flush_text();
        let node = self.document.create_comment(text);
        self.attach(node);
    }

    fn doctype(&mut self, name: String, public_id: Option<String>, system_id: Option<String>) {
        self.flush_text();
        let node = self.document.create_doctype(name, public_id, system_id);
        self.attach(node);
    }
}

impl Document {
    /// Parse an HTML document or fragment
    pub fn parse_html(html: &str) -> Result<Document, DiagramError> {
        let parse_span = span!(Level::DEBUG, "parse_html", input_len = html.len());
        let _enter = parse_span.enter();

        let builder = Rc::new(RefCell::new(TreeBuilder::default()));

        let on_element = Rc::clone(&builder);
        let on_doctype = Rc::clone(&builder);
        let on_comment = Rc::clone(&builder);
        let on_text = Rc::clone(&builder);

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![element!("*", move |el| {
                    let mut data = ElementData::new(el.tag_name());
                    data.attributes = el
                        .attributes()
                        .iter()
                        .map(|attr| Attribute {
                            name: attr.name().to_ascii_lowercase(),
                            value: htmlize::unescape_attribute(&attr.value()).into_owned(),
                        })
                        .collect();

                    match el.end_tag_handlers() {
                        Some(handlers) => {
                            let node = on_element.borrow_mut().open_element(data, true);
                            let on_end = Rc::clone(&on_element);
                            let on_close: lol_html::EndTagHandler<'static> =
                                Box::new(move |_end: &mut EndTag<'_>| {
                                    on_end.borrow_mut().close(node);
                                    Ok(())
                                });
                            handlers.push(on_close);
                        }
                        None => {
                            on_element.borrow_mut().open_element(data, false);
                        }
                    }
                    Ok(())
                })],
                document_content_handlers: vec![
                    doctype!(move |d| {
                        on_doctype.borrow_mut().doctype(
                            d.name().unwrap_or_default(),
                            d.public_id(),
                            d.system_id(),
                        );
                        Ok(())
                    }),
                    doc_comments!(move |c| {
                        on_comment.borrow_mut().comment(c.text());
                        Ok(())
                    }),
                    doc_text!(move |t| {
                        let decode = matches!(t.text_type(), TextType::Data | TextType::RCData);
                        let mut builder = on_text.borrow_mut();
                        builder.push_text(t.as_str(), decode);
                        if t.last_in_text_node() {
                            builder.flush_text();
                        }
                        Ok(())
                    }),
                ],
                ..Settings::new()
            },
            |_: &[u8]| {},
        );

        rewriter
            .write(html.as_bytes())
            .map_err(|e| DiagramError::parse_error(e.to_string()))?;
        rewriter
            .end()
            .map_err(|e| DiagramError::parse_error(e.to_string()))?;

        let mut builder = builder.borrow_mut();
        builder.flush_text();
        if let Some(error) = builder.error.take() {
            return Err(error);
        }
        let document = std::mem::take(&mut builder.document);
        debug!(nodes = document.len(), "Parsed HTML document");
        Ok(document)
    }

    /// Serialize the reachable tree back to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.write_node(child, false, &mut out);
        }
        out
    }

    /// Serialize a single node and its subtree
    pub fn node_to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.data(id) {
            NodeData::Root => {
                for &child in self.children(id) {
                    self.write_node(child, false, out);
                }
            }
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                match (public_id, system_id) {
                    (Some(public), Some(system)) => {
                        out.push_str(&format!(" PUBLIC \"{}\" \"{}\"", public, system))
                    }
                    (Some(public), None) => out.push_str(&format!(" PUBLIC \"{}\"", public)),
                    (None, Some(system)) => out.push_str(&format!(" SYSTEM \"{}\"", system)),
                    (None, None) => {}
                }
                out.push('>');
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&htmlize::escape_text(text.as_str()));
                }
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for attr in &el.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&htmlize::escape_attribute(attr.value.as_str()));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&el.name) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
                for &child in self.children(id) {
                    self.write_node(child, raw, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}
