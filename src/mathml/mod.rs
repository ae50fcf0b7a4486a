//! MathML reader
//!
//! Turns the MathML string of a component into a tree of [`MathElement`]s.
//! Only elements and their text survive; comments, processing instructions
//! and namespaces are dropped. Interpreting the tree is the analyser's job.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors raised while reading MathML
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    /// The text is not well formed XML
    #[error("XML error at position {position}: {message}")]
    Xml { position: u64, message: String },

    /// An end tag without a matching start tag
    #[error("Unexpected end tag '{0}'")]
    UnexpectedEnd(String),

    /// The text ended before an element was closed
    #[error("Element '{0}' is not closed")]
    Unclosed(String),

    /// A top level element other than `math`
    #[error("Expected a 'math' element, found '{0}'")]
    NotMath(String),
}

/// One MathML element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MathElement {
    /// Local name, without namespace prefix
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MathElement>,
    /// Concatenated, trimmed text content of this element only
    pub text: String,
}

impl MathElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Value of an attribute, by local name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, index: usize) -> Option<&MathElement> {
        self.children.get(index)
    }

    /// The text pieces of a `cn`, split by `<sep/>`
    ///
    /// Text following a separator is attached to the separator element.
    pub fn text_parts(&self) -> Vec<&str> {
        let mut parts = vec![self.text.as_str()];
        for child in &self.children {
            if child.is("sep") {
                parts.push(child.text.as_str());
            }
        }
        parts
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<MathElement, MathError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut element = MathElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| MathError::Xml {
            position: 0,
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        if key == "xmlns" || attribute.key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let value = String::from_utf8_lossy(&attribute.value).into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn append(stack: &mut [MathElement], roots: &mut Vec<MathElement>, element: MathElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

/// Parse a MathML string into its top level elements
///
/// Every top level element must be `math`. A blank string yields no element.
pub fn parse_math(text: &str) -> Result<Vec<MathElement>, MathError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<MathElement> = Vec::new();
    let mut roots = Vec::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(MathError::Xml {
                    position: reader.error_position(),
                    message: e.to_string(),
                })
            }
        };

        match event {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                append(&mut stack, &mut roots, element);
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                let element = match stack.pop() {
                    Some(element) if element.name == name => element,
                    _ => return Err(MathError::UnexpectedEnd(name)),
                };
                append(&mut stack, &mut roots, element);
            }
            Event::Text(content) => {
                let content = String::from_utf8_lossy(&content).trim().to_string();
                if let Some(current) = stack.last_mut() {
                    // Text after a <sep/> belongs to the separator
                    let after_sep = current.children.last().is_some_and(|last| last.is("sep"));
                    match current.children.last_mut() {
                        Some(last) if after_sep => last.text.push_str(&content),
                        _ => current.text.push_str(&content),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(MathError::Unclosed(open.name));
    }

    if let Some(other) = roots.iter().find(|root| !root.is("math")) {
        return Err(MathError::NotMath(other.name.clone()));
    }

    Ok(roots)
}
