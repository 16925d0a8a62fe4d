//! component_descriptor (DVB): identifies one elementary stream of a
//! service. Two 4-bit content fields, a component type and tag, a language
//! code and a free text description to the end of the payload.

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::Edid;
use crate::err::XmlError;
use crate::lang::LanguageCode;
use crate::registry::Registration;
use crate::standards::Standards;
use crate::traits::{DecodeState, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = 0x50;
const XML_NAME: &str = "component_descriptor";

/// Several components legitimately coexist in one loop (one descriptor per
/// elementary stream), so the duplication mode stays the default `Add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub stream_content_ext: u8,
    pub stream_content: u8,
    pub component_type: u8,
    pub component_tag: u8,
    pub language: LanguageCode,
    pub text: String,
    state: DecodeState,
}

impl Default for ComponentDescriptor {
    fn default() -> Self {
        ComponentDescriptor {
            // All ones when the extension is unused, per the wire format.
            stream_content_ext: 0x0F,
            stream_content: 0,
            component_type: 0,
            component_tag: 0,
            language: LanguageCode::default(),
            text: String::new(),
            state: DecodeState::Empty,
        }
    }
}

impl ComponentDescriptor {
    pub fn new(
        stream_content: u8,
        component_type: u8,
        component_tag: u8,
        language: LanguageCode,
        text: impl Into<String>,
    ) -> Self {
        ComponentDescriptor {
            stream_content,
            component_type,
            component_tag,
            language,
            text: text.into(),
            state: DecodeState::Valid,
            ..ComponentDescriptor::default()
        }
    }
}

impl TypedDescriptor for ComponentDescriptor {
    fn edid(&self) -> Edid {
        Edid::Standard {
            tag: TAG,
            standards: Standards::DVB,
        }
    }

    fn xml_name(&self) -> &'static str {
        XML_NAME
    }

    fn state(&self) -> DecodeState {
        self.state
    }

    fn clear(&mut self) {
        *self = ComponentDescriptor::default();
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, ctx: &Context<'_>) {
        buf.put_bits(self.stream_content_ext.into(), 4);
        buf.put_bits(self.stream_content.into(), 4);
        buf.put_u8(self.component_type);
        buf.put_u8(self.component_tag);
        buf.put_language_code(self.language);
        buf.put_string(&self.text, ctx.default_charset());
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        self.stream_content_ext = buf.get_bits(4) as u8;
        self.stream_content = buf.get_bits(4) as u8;
        self.component_type = buf.get_u8();
        self.component_tag = buf.get_u8();
        self.language = buf.get_language_code();
        self.text = buf.get_string(ctx.default_charset());
        self.state = if buf.ok() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
    }

    fn build_xml(&self, _ctx: &Context<'_>) -> Element {
        let mut element = Element::new(XML_NAME);
        element.set_hex_attr("stream_content_ext", self.stream_content_ext.into(), 1);
        element.set_hex_attr("stream_content", self.stream_content.into(), 1);
        element.set_hex_attr("component_type", self.component_type.into(), 2);
        element.set_hex_attr("component_tag", self.component_tag.into(), 2);
        element.set_attr("language_code", self.language.as_str());
        if !self.text.is_empty() {
            element.set_attr("text", &self.text);
        }
        element
    }

    fn analyze_xml(&mut self, element: &Element, _ctx: &Context<'_>) -> Result<(), XmlError> {
        self.clear();
        self.state = DecodeState::Decoding;
        let result = self.analyze_xml_fields(element);
        self.state = if result.is_ok() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
        result
    }

    fn languages(&self) -> Vec<LanguageCode> {
        vec![self.language]
    }
}

impl ComponentDescriptor {
    fn analyze_xml_fields(&mut self, element: &Element) -> Result<(), XmlError> {
        self.stream_content_ext = match element.attr("stream_content_ext") {
            Some(_) => element.u8_attr_in("stream_content_ext", 0, 15)?,
            None => 0x0F,
        };
        self.stream_content = element.u8_attr_in("stream_content", 0, 15)?;
        self.component_type = element.u8_attr("component_type")?;
        self.component_tag = element.u8_attr("component_tag")?;
        self.language = element.language_attr("language_code")?;
        self.text = element.attr("text").unwrap_or_default().to_string();
        Ok(())
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        edid: Edid::Standard {
            tag: TAG,
            standards: Standards::DVB,
        },
        factory: || Box::new(ComponentDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &[],
    }
}
