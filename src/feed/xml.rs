//! Generic XML-to-tree conversion for syndication feeds.
//!
//! The feed is not mapped onto a fixed schema. Instead every element becomes
//! an [`XmlValue`], mirroring the document's tag structure:
//!
//! - an element with neither attributes nor children is [`XmlValue::Text`]
//! - an element with attributes or children is [`XmlValue::Element`], with
//!   attributes stored under `@_name` keys and any text under `#text`
//! - a tag repeated under the same parent collapses into [`XmlValue::List`]
//!
//! Namespace prefixes are dropped from element and attribute names, so
//! `<media:content filesize="1">` is reachable as `content` / `@_filesize`.
use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Key prefix under which element attributes are stored.
pub const ATTRIBUTE_PREFIX: &str = "@_";

/// Key under which an element's text is stored when it also has attributes
/// or children.
pub const TEXT_KEY: &str = "#text";

/// SEC-003: Maximum element nesting depth accepted from upstream feeds.
const MAX_XML_DEPTH: usize = 64;

/// Errors that can occur while building the tree.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The document is not well-formed XML.
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// The document ended while elements were still open.
    #[error("XML document ended inside <{0}>")]
    UnclosedElement(String),

    /// SEC-003: Nesting depth exceeds safety limit.
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

/// A node of the parsed feed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlValue {
    Text(String),
    Element(BTreeMap<String, XmlValue>),
    List(Vec<XmlValue>),
}

impl XmlValue {
    /// Returns the child stored under `key`, if this node is an element.
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Element(map) => map.get(key),
            _ => None,
        }
    }

    /// Walks a chain of child keys from this node.
    pub fn path(&self, keys: &[&str]) -> Option<&XmlValue> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Returns the text content of this node.
    ///
    /// Elements yield their `#text` entry; lists yield the text of their
    /// first member.
    pub fn text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(s) => Some(s),
            XmlValue::Element(map) => map.get(TEXT_KEY).and_then(XmlValue::text),
            XmlValue::List(values) => values.first().and_then(XmlValue::text),
        }
    }

    /// Returns the value of attribute `name` (without prefix).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            XmlValue::Element(map) => map
                .get(&format!("{ATTRIBUTE_PREFIX}{name}"))
                .and_then(XmlValue::text),
            _ => None,
        }
    }

    /// Views this node as a sequence.
    ///
    /// Feeds emit a lone `<item>` as a single element and several as a list;
    /// callers iterate the result without caring which one they got.
    pub fn as_sequence(&self) -> &[XmlValue] {
        match self {
            XmlValue::List(values) => values,
            other => std::slice::from_ref(other),
        }
    }
}

/// An element whose end tag has not been seen yet.
struct OpenElement {
    name: String,
    children: BTreeMap<String, XmlValue>,
    text: String,
}

impl OpenElement {
    fn new(name: String) -> Self {
        Self {
            name,
            children: BTreeMap::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> XmlValue {
        let text = self.text.trim();
        if self.children.is_empty() {
            return XmlValue::Text(text.to_string());
        }
        let mut children = self.children;
        if !text.is_empty() {
            children.insert(TEXT_KEY.to_string(), XmlValue::Text(text.to_string()));
        }
        XmlValue::Element(children)
    }
}

/// Inserts `value` under `key`, turning repeated keys into a list.
fn insert_child(children: &mut BTreeMap<String, XmlValue>, key: String, value: XmlValue) {
    match children.remove(&key) {
        None => {
            children.insert(key, value);
        }
        Some(XmlValue::List(mut values)) => {
            values.push(value);
            children.insert(key, XmlValue::List(values));
        }
        Some(existing) => {
            children.insert(key, XmlValue::List(vec![existing, value]));
        }
    }
}

/// Parses raw feed text into a tree rooted at an unnamed document element.
///
/// The root's children are the document's top-level elements, so an RSS
/// feed's items live at `["rss", "channel", "item"]`.
///
/// # Errors
///
/// Fails only on structurally invalid XML (syntax errors, unclosed
/// elements, excessive nesting). Feed semantics are not validated.
///
/// # Security
///
/// SEC-002: quick-xml (0.37) never expands `<!ENTITY>` declarations; custom
/// entity references surface as syntax errors instead of file contents.
pub fn parse(content: &str) -> Result<XmlValue, XmlError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<OpenElement> = vec![OpenElement::new(String::new())];
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XmlError::Syntax {
                position: reader.error_position() as u64,
                message: e.to_string(),
            })?;

        match event {
            Event::Start(e) => {
                // The document root does not count towards depth
                if stack.len() > MAX_XML_DEPTH {
                    return Err(XmlError::MaxDepthExceeded(MAX_XML_DEPTH));
                }
                let mut open = OpenElement::new(local_name(e.local_name().as_ref()));
                read_attributes(&e, &reader, &mut open.children)?;
                stack.push(open);
            }
            Event::Empty(e) => {
                let mut open = OpenElement::new(local_name(e.local_name().as_ref()));
                read_attributes(&e, &reader, &mut open.children)?;
                let name = std::mem::take(&mut open.name);
                if let Some(parent) = stack.last_mut() {
                    insert_child(&mut parent.children, name, open.into_value());
                }
            }
            Event::End(_) => {
                // check_end_names guarantees the end tag matches the open one
                if stack.len() > 1 {
                    if let Some(mut closed) = stack.pop() {
                        let name = std::mem::take(&mut closed.name);
                        if let Some(parent) = stack.last_mut() {
                            insert_child(&mut parent.children, name, closed.into_value());
                        }
                    }
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|err| XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    message: err.to_string(),
                })?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if stack.len() > 1 {
        let name = stack
            .last()
            .map(|open| open.name.clone())
            .unwrap_or_default();
        return Err(XmlError::UnclosedElement(name));
    }

    let root = stack.pop().map(|open| open.children).unwrap_or_default();
    Ok(XmlValue::Element(root))
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Copies an element's attributes into `children` under prefixed keys.
///
/// Namespace declarations are dropped along with the prefixes they bind.
fn read_attributes(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    children: &mut BTreeMap<String, XmlValue>,
) -> Result<(), XmlError> {
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed feed attribute");
                continue;
            }
        };
        let key = attr.key;
        if key.as_ref() == b"xmlns" || key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| XmlError::Syntax {
                position: reader.buffer_position() as u64,
                message: err.to_string(),
            })?;
        let name = format!(
            "{ATTRIBUTE_PREFIX}{}",
            local_name(key.local_name().as_ref())
        );
        children.insert(name, XmlValue::Text(value.trim().to_string()));
    }
    Ok(())
}
