//! Decoding of PAN-OS XML API responses into configuration trees.
//!
//! Every API call answers with an envelope of the form
//! `<response status="success"><result>…</result></response>`. The payload
//! under `<result>` is converted into a `serde_json::Value` using the common
//! XML-to-JSON conventions downstream tooling expects from a Panorama export:
//!
//! * attributes become `"@name"` keys,
//! * an element with only text becomes a string,
//! * text next to attributes or children goes under `"#text"`,
//! * repeated child names collapse into an array, in document order,
//! * an element with no attributes, children or text becomes `null`.

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::errors::{CollectorError, Result};

/// A parsed XML element. Text and CDATA segments are concatenated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| CollectorError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| CollectorError::Xml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    /// Returns the value of attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Converts this element's content into a configuration tree.
    pub fn to_value(&self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text.clone())
            };
        }

        let mut map = Map::new();
        for (key, value) in &self.attributes {
            map.insert(format!("@{}", key), Value::String(value.clone()));
        }
        for child in &self.children {
            let value = child.to_value();
            match map.get_mut(&child.name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(child.name.clone(), value);
                }
            }
        }
        if !self.text.is_empty() {
            map.insert("#text".to_string(), Value::String(self.text.clone()));
        }
        Value::Object(map)
    }

    fn collect_text(&self, out: &mut Vec<String>) {
        if !self.text.is_empty() {
            out.push(self.text.clone());
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// Parses an XML document and returns its root element.
pub fn parse_document(body: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(XmlElement::from_start(&start)?),
            Ok(Event::Empty(start)) => {
                let element = XmlElement::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CollectorError::Xml("unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|e| CollectorError::Xml(e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(String::from_utf8_lossy(&cdata.into_inner()).trim());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CollectorError::Xml(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            // Declarations, comments, processing instructions and doctypes carry no config.
            Ok(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CollectorError::Xml(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| CollectorError::Xml("document has no root element".to_string()))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(CollectorError::Xml(
                "multiple root elements in document".to_string(),
            ))
        }
    }
    Ok(())
}

/// Unwraps a PAN-OS `<response>` envelope.
///
/// Returns the `<result>` element on success (or `None` when the response
/// has no result), and `CollectorError::Api` carrying the message text when
/// `status="error"`.
pub fn unwrap_response(body: &str) -> Result<Option<XmlElement>> {
    let root = parse_document(body)?;
    if root.name != "response" {
        return Err(CollectorError::UnexpectedResponse(format!(
            "expected <response> envelope, found <{}>",
            root.name
        )));
    }

    match root.attribute("status") {
        Some("success") => Ok(root.children.into_iter().find(|c| c.name == "result")),
        Some("error") => {
            let mut parts = Vec::new();
            root.collect_text(&mut parts);
            let message = if parts.is_empty() {
                match root.attribute("code") {
                    Some(code) => format!("error code {}", code),
                    None => "unspecified error".to_string(),
                }
            } else {
                parts.join("; ")
            };
            debug!("PAN-OS API error response: {}", message);
            Err(CollectorError::Api(message))
        }
        other => Err(CollectorError::UnexpectedResponse(format!(
            "unknown response status {:?}",
            other
        ))),
    }
}

/// Decodes an API response body into the configuration tree under `<result>`.
///
/// A successful response without a `<result>` element yields `null`.
pub fn parse_response(body: &str) -> Result<Value> {
    Ok(unwrap_response(body)?
        .map(|result| result.to_value())
        .unwrap_or(Value::Null))
}
