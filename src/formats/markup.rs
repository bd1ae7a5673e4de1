//! Markup cleanup and a small element tree for map documents.
//!
//! Exported KML is frequently namespaced, prefixed and sprinkled with bare
//! ampersands. [`normalize`] rewrites it into something a non-namespace-aware
//! parser accepts, and [`parse_document`] turns it into an [`Element`] tree.

use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::{Captures, Regex};

use crate::error::ParseFailure;

static XML_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\?xml[^>]*\?>").expect("valid declaration regex"));

static NAMESPACE_DOUBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"xmlns(:[A-Za-z0-9_-]+)?="[^"]*""#).expect("valid namespace regex")
});

static NAMESPACE_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"xmlns(:[A-Za-z0-9_-]+)?='[^']*'").expect("valid namespace regex")
});

static TAG_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)[A-Za-z0-9_-]+:([A-Za-z0-9_-]+)").expect("valid prefix regex")
});

static AMPERSAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(amp;|lt;|gt;|quot;|apos;|#)?").expect("valid entity regex"));

/// Sanitize decoded markup. The steps run in a fixed order since later ones
/// assume the earlier cleanup happened.
pub fn normalize(text: &str) -> String {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let text = XML_DECLARATION.replace_all(text, "");
    let text = NAMESPACE_DOUBLE.replace_all(&text, "");
    let text = NAMESPACE_SINGLE.replace_all(&text, "");
    // <kml:Placemark> -> <Placemark>
    let text = TAG_PREFIX.replace_all(&text, "<$1$2");
    let text = AMPERSAND.replace_all(&text, |caps: &Captures| match caps.get(1) {
        Some(entity) => format!("&{}", entity.as_str()),
        None => "&amp;".to_string(),
    });
    text.trim().to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Element with its attributes and children in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First direct child with this name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Every element below this one with this name, depth first in document
    /// order. Does not look inside matches.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect_named(self, name, &mut found);
        found
    }

    /// Concatenated text of this element and everything below it
    pub fn text(&self) -> String {
        let mut out = String::new();
        push_text(self, &mut out);
        out
    }

    /// Trimmed text of the named direct child, if present and non-empty
    pub fn child_text(&self, name: &str) -> Option<String> {
        let text = self.child(name)?.text();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

fn collect_named<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in element.elements() {
        if child.name == name {
            found.push(child);
        } else {
            collect_named(child, name, found);
        }
    }
}

fn push_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) => push_text(e, out),
        }
    }
}

fn start_element(start: &BytesStart) -> Result<Element, ParseFailure> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseFailure::Markup(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = quick_xml::escape::unescape(&raw)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Parse normalized markup into its root element.
///
/// Fails on malformed structure, on a document without a root element and on
/// non-whitespace text outside the root.
pub fn parse_document(text: &str) -> Result<Element, ParseFailure> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(ParseFailure::Markup(
                        "more than one root element".to_string(),
                    ));
                }
                stack.push(start_element(&start)?);
            }
            Event::Empty(start) => {
                let element = start_element(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None if root.is_none() => root = Some(element),
                    None => {
                        return Err(ParseFailure::Markup(
                            "more than one root element".to_string(),
                        ))
                    }
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    ParseFailure::Markup("closing tag without opening tag".to_string())
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let text = String::from_utf8_lossy(&text).into_owned();
                push_text_node(&mut stack, text)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                push_text_node(&mut stack, text)?;
            }
            Event::GeneralRef(reference) => {
                let text = if let Some(ch) = reference
                    .resolve_char_ref()
                    .map_err(|e| ParseFailure::Markup(e.to_string()))?
                {
                    ch.to_string()
                } else {
                    let name = String::from_utf8_lossy(&reference).into_owned();
                    match quick_xml::escape::resolve_predefined_entity(&name) {
                        Some(resolved) => resolved.to_string(),
                        None => format!("&{};", name),
                    }
                };
                push_text_node(&mut stack, text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseFailure::Markup(format!(
            "unclosed element <{}>",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        )));
    }

    root.ok_or_else(|| ParseFailure::Markup("document has no root element".to_string()))
}

fn push_text_node(stack: &mut [Element], text: String) -> Result<(), ParseFailure> {
    match stack.last_mut() {
        Some(parent) => {
            // Entity references arrive as separate events; keep runs joined.
            if let Some(Node::Text(previous)) = parent.children.last_mut() {
                previous.push_str(&text);
            } else {
                parent.children.push(Node::Text(text));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ParseFailure::Markup(
            "text outside the root element".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_bom_and_declaration() {
        let text = "\u{feff}<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<kml></kml>\n";
        assert_eq!(normalize(text), "<kml></kml>");
    }

    #[test]
    fn test_normalize_strips_namespaces() {
        let text = r#"<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx='http://www.google.com/kml/ext/2.2'><Document/></kml>"#;
        let clean = normalize(text);
        assert!(!clean.contains("xmlns"));
        assert!(clean.contains("<Document/>"));
    }

    #[test]
    fn test_normalize_strips_tag_prefixes() {
        let text = "<kml:Placemark><kml:name>A</kml:name><gx:Track></gx:Track></kml:Placemark>";
        assert_eq!(
            normalize(text),
            "<Placemark><name>A</name><Track></Track></Placemark>"
        );
    }

    #[test]
    fn test_normalize_escapes_bare_ampersands() {
        let text = "<name>Tarla & Bahçe &amp; Ev &#38; &lt;x&gt;</name>";
        assert_eq!(
            normalize(text),
            "<name>Tarla &amp; Bahçe &amp; Ev &#38; &lt;x&gt;</name>"
        );
    }

    #[test]
    fn test_normalize_escapes_unknown_entities() {
        assert_eq!(normalize("<a>x&nbsp;y</a>"), "<a>x&amp;nbsp;y</a>");
    }

    #[test]
    fn test_parse_document_tree() {
        let root = parse_document(
            r#"<kml><Document><Placemark id="p1"><name>A &amp; B</name></Placemark><Placemark/></Document></kml>"#,
        )
        .unwrap();
        assert_eq!(root.name, "kml");
        let placemarks = root.descendants_named("Placemark");
        assert_eq!(placemarks.len(), 2);
        assert_eq!(placemarks[0].attr("id"), Some("p1"));
        assert_eq!(placemarks[0].child_text("name").as_deref(), Some("A & B"));
    }

    #[test]
    fn test_parse_document_cdata() {
        let root =
            parse_document("<description><![CDATA[<b>bold</b> & more]]></description>").unwrap();
        assert_eq!(root.text(), "<b>bold</b> & more");
    }

    #[test]
    fn test_parse_document_prefixed_attribute_local_name() {
        let root = parse_document(r#"<kml xsi:schemaLocation="x"/>"#).unwrap();
        assert_eq!(root.attr("schemaLocation"), Some("x"));
    }

    #[test]
    fn test_parse_document_rejects_mismatched_tags() {
        assert!(parse_document("<kml><Document></kml>").is_err());
    }

    #[test]
    fn test_parse_document_rejects_unclosed() {
        assert!(parse_document("<kml><Document>").is_err());
    }

    #[test]
    fn test_parse_document_rejects_no_root() {
        assert!(parse_document("").is_err());
        assert!(parse_document("just some text").is_err());
    }

    #[test]
    fn test_parse_document_rejects_trailing_text() {
        assert!(parse_document("<kml/>garbage").is_err());
    }
}
