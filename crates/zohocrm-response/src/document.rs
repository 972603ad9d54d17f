//! XML loading into a small, read-only element tree.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::types::{ResponseError, ResponseResult};

/// Nesting limit used by [`load`]. Every known response shape is far shallower.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// One XML element with its attributes, element children and direct text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> ResponseResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| {
                ResponseError::MalformedDocument(format!("invalid attribute on <{name}>: {e}"))
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = match attr.unescape_value() {
                Ok(value) => value.to_string(),
                Err(e) => {
                    tracing::debug!("Keeping raw value of attribute {key} on <{name}>: {e}");
                    String::from_utf8_lossy(&attr.value).to_string()
                }
            };
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Tag name, including any namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// First child element with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow the first matching child at each step of `path`.
    pub fn path(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Concatenated text and CDATA directly inside this element, untrimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text)
    }
}

/// A well-formed document and its root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Parse `text`, rejecting anything nested deeper than `max_depth`.
    pub fn parse(text: &str, max_depth: usize) -> ResponseResult<Self> {
        let mut reader = Reader::from_str(text);
        let mut open: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                ResponseError::MalformedDocument(format!(
                    "XML parse error at byte {}: {e}",
                    reader.error_position()
                ))
            })?;

            match event {
                Event::Start(start) => {
                    ensure_single_root(root.as_ref())?;
                    if open.len() >= max_depth {
                        return Err(ResponseError::MalformedDocument(format!(
                            "nesting exceeds {max_depth} levels"
                        )));
                    }
                    open.push(Element::from_start(&start)?);
                }
                Event::Empty(start) => {
                    ensure_single_root(root.as_ref())?;
                    let element = Element::from_start(&start)?;
                    attach(&mut open, &mut root, element);
                }
                Event::End(_) => {
                    // Mismatched end tags are rejected by the reader itself.
                    if let Some(element) = open.pop() {
                        attach(&mut open, &mut root, element);
                    }
                }
                Event::Text(text) => {
                    let content = match text.unescape() {
                        Ok(content) => content,
                        Err(e) => {
                            tracing::debug!("Keeping raw text after unescape failure: {e}");
                            String::from_utf8_lossy(&text).into_owned().into()
                        }
                    };
                    append_text(&mut open, content)?;
                }
                Event::CData(data) => {
                    append_text(&mut open, String::from_utf8_lossy(&data))?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype.
                _ => {}
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(ResponseError::MalformedDocument(format!(
                "unclosed element <{}>",
                unclosed.name
            )));
        }

        root.map(|root| Self { root })
            .ok_or_else(|| ResponseError::MalformedDocument("no root element".to_string()))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The root's `uri` attribute, empty when absent.
    pub fn uri(&self) -> &str {
        self.root.attr("uri").unwrap_or_default()
    }

    /// First `result` child of the root.
    pub fn result(&self) -> Option<&Element> {
        self.root.child("result")
    }
}

/// Load a document with the default nesting limit.
pub fn load(text: &str) -> ResponseResult<Document> {
    Document::parse(text, DEFAULT_MAX_DEPTH)
}

fn ensure_single_root(root: Option<&Element>) -> ResponseResult<()> {
    match root {
        Some(existing) => Err(ResponseError::MalformedDocument(format!(
            "content after root element <{}>",
            existing.name
        ))),
        None => Ok(()),
    }
}

fn attach(open: &mut [Element], root: &mut Option<Element>, element: Element) {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn append_text(open: &mut [Element], content: Cow<'_, str>) -> ResponseResult<()> {
    match open.last_mut() {
        Some(parent) => {
            parent.text.push_str(&content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(ResponseError::MalformedDocument(
            "text outside the root element".to_string(),
        )),
    }
}
