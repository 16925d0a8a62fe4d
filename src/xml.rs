//! Minimal XML document model for the descriptor editing form.
//!
//! One element per descriptor; attribute and child access is typed and
//! reports violations with the element name and source line, so one bad
//! element never aborts the decoding of its siblings.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::err::XmlError;
use crate::lang::LanguageCode;
use crate::utils::{parse_hex, to_hex};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
    line: usize,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source line of the start tag; 1 for built elements.
    pub fn line(&self) -> usize {
        self.line.max(1)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    // -- building -----------------------------------------------------

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.push((name.to_string(), value.into()));
    }

    pub fn set_bool_attr(&mut self, name: &str, value: bool) {
        self.set_attr(name, if value { "true" } else { "false" });
    }

    pub fn set_hex_attr(&mut self, name: &str, value: u64, digits: usize) {
        self.set_attr(name, format!("0x{value:0digits$X}"));
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_hex_text(&mut self, bytes: &[u8]) {
        self.text = to_hex(bytes);
    }

    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    // -- typed attribute access ---------------------------------------

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn req_attr(&self, name: &str) -> Result<&str, XmlError> {
        self.attr(name).ok_or_else(|| XmlError::MissingAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
            line: self.line(),
        })
    }

    /// Integer attribute, decimal or `0x` hex, checked against an
    /// inclusive range.
    pub fn u64_attr_in(&self, name: &str, min: u64, max: u64) -> Result<u64, XmlError> {
        let raw = self.req_attr(name)?;
        let value = parse_int(raw).ok_or_else(|| XmlError::InvalidAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
            value: raw.to_string(),
            line: self.line(),
        })?;
        if value < min || value > max {
            return Err(XmlError::OutOfRange {
                element: self.name.clone(),
                attribute: name.to_string(),
                value,
                min,
                max,
                line: self.line(),
            });
        }
        Ok(value)
    }

    pub fn u8_attr(&self, name: &str) -> Result<u8, XmlError> {
        self.u8_attr_in(name, 0, u8::MAX)
    }

    pub fn u8_attr_in(&self, name: &str, min: u8, max: u8) -> Result<u8, XmlError> {
        Ok(self.u64_attr_in(name, min.into(), max.into())? as u8)
    }

    pub fn u16_attr(&self, name: &str) -> Result<u16, XmlError> {
        Ok(self.u64_attr_in(name, 0, u16::MAX.into())? as u16)
    }

    pub fn u16_attr_in(&self, name: &str, min: u16, max: u16) -> Result<u16, XmlError> {
        Ok(self.u64_attr_in(name, min.into(), max.into())? as u16)
    }

    pub fn u32_attr(&self, name: &str) -> Result<u32, XmlError> {
        Ok(self.u64_attr_in(name, 0, u32::MAX.into())? as u32)
    }

    pub fn opt_u8_attr(&self, name: &str) -> Result<Option<u8>, XmlError> {
        match self.attr(name) {
            None => Ok(None),
            Some(_) => Ok(Some(self.u8_attr(name)?)),
        }
    }

    pub fn bool_attr(&self, name: &str) -> Result<bool, XmlError> {
        let raw = self.req_attr(name)?;
        match raw {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(XmlError::InvalidAttribute {
                element: self.name.clone(),
                attribute: name.to_string(),
                value: raw.to_string(),
                line: self.line(),
            }),
        }
    }

    pub fn language_attr(&self, name: &str) -> Result<LanguageCode, XmlError> {
        let raw = self.req_attr(name)?;
        raw.parse().map_err(|()| XmlError::InvalidAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
            value: raw.to_string(),
            line: self.line(),
        })
    }

    pub fn opt_language_attr(&self, name: &str) -> Result<Option<LanguageCode>, XmlError> {
        match self.attr(name) {
            None => Ok(None),
            Some(_) => Ok(Some(self.language_attr(name)?)),
        }
    }

    /// The element's text content parsed as hex bytes.
    pub fn hex_text(&self) -> Result<Vec<u8>, XmlError> {
        parse_hex(&self.text).ok_or_else(|| XmlError::BadHexContent {
            element: self.name.clone(),
            line: self.line(),
        })
    }
}

fn parse_int(raw: &str) -> Option<u64> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        raw.parse().ok()
    }
}

/// Parses one XML document and returns its root element.
pub fn parse_document(text: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(XmlError::malformed)?;
        let line = line_of(text, reader.buffer_position() as usize);
        match event {
            Event::Start(start) => {
                stack.push(element_from_start(&start, line)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start, line)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::malformed("unbalanced end tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                let value = t.unescape().map_err(XmlError::malformed)?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&value);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and DOCTYPE
            // carry nothing a descriptor document needs.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::malformed("unterminated element"));
    }
    root.ok_or_else(|| XmlError::malformed("document has no root element"))
}

fn element_from_start(start: &BytesStart<'_>, line: usize) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(XmlError::malformed)?
        .to_string();
    let mut element = Element {
        name,
        line,
        ..Element::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(XmlError::malformed)?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(XmlError::malformed)?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(XmlError::malformed)?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(XmlError::malformed("multiple root elements"))
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    1 + text.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count()
}

/// Serializes a document: XML declaration plus the indented root element.
pub fn write_document(root: &Element) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(XmlError::malformed)?;
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(XmlError::malformed)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() && element.text.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(XmlError::malformed)?;
        return Ok(());
    }
    writer
        .write_event(Event::Start(start))
        .map_err(XmlError::malformed)?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(XmlError::malformed)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(XmlError::malformed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "<descriptors>\n  <service_descriptor service_type=\"0x01\" \
                       service_name=\"News &amp; More\"/>\n  <blob>AB 01</blob>\n</descriptors>";

    #[test]
    fn parses_attributes_children_and_text() {
        let root = parse_document(DOC).unwrap();
        assert_eq!(root.name(), "descriptors");
        assert_eq!(root.children().len(), 2);

        let service = &root.children()[0];
        assert_eq!(service.u8_attr("service_type").unwrap(), 0x01);
        assert_eq!(service.req_attr("service_name").unwrap(), "News & More");
        assert_eq!(root.children()[1].hex_text().unwrap(), vec![0xAB, 0x01]);
    }

    #[test]
    fn tracks_source_lines() {
        let root = parse_document(DOC).unwrap();
        assert_eq!(root.line(), 1);
        assert_eq!(root.children()[0].line(), 2);
        assert_eq!(root.children()[1].line(), 3);
    }

    #[test]
    fn missing_attribute_names_element_and_line() {
        let root = parse_document(DOC).unwrap();
        let err = root.children()[0].u8_attr("component_tag").unwrap_err();
        assert_eq!(
            err,
            XmlError::MissingAttribute {
                element: "service_descriptor".to_string(),
                attribute: "component_tag".to_string(),
                line: 2,
            }
        );
    }

    #[test]
    fn range_violations_carry_the_bounds() {
        let root = parse_document("<d x=\"300\"/>").unwrap();
        let err = root.u8_attr("x").unwrap_err();
        assert!(matches!(err, XmlError::OutOfRange { value: 300, max: 255, .. }));
    }

    #[test]
    fn integers_accept_decimal_and_hex() {
        let root = parse_document("<d a=\"17\" b=\"0x11\"/>").unwrap();
        assert_eq!(root.u16_attr("a").unwrap(), root.u16_attr("b").unwrap());
    }

    #[test]
    fn document_round_trip() {
        let mut root = Element::new("descriptors");
        let mut child = Element::new("stream_identifier_descriptor");
        child.set_hex_attr("component_tag", 0x42, 2);
        root.add_child(child);
        let mut blob = Element::new("private_data");
        blob.set_hex_text(&[0xDE, 0xAD]);
        root.add_child(blob);

        let text = write_document(&root).unwrap();
        let reparsed = parse_document(&text).unwrap();
        assert_eq!(reparsed.children()[0].u8_attr("component_tag").unwrap(), 0x42);
        assert_eq!(reparsed.children()[1].hex_text().unwrap(), vec![0xDE, 0xAD]);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("").is_err());
    }
}
