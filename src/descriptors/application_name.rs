//! application_name_descriptor (AIT tag 0x01): one display name per
//! language. The tag only means this inside an Application Information
//! Table; the base tables reuse 0x01 for other purposes.

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::Edid;
use crate::err::XmlError;
use crate::lang::LanguageCode;
use crate::registry::Registration;
use crate::traits::{DecodeState, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = 0x01;

/// Table id of the Application Information Table.
pub const AIT_TABLE_ID: u8 = 0x74;

const XML_NAME: &str = "application_name_descriptor";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationName {
    pub language: LanguageCode,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationNameDescriptor {
    pub names: Vec<ApplicationName>,
    state: DecodeState,
}

impl ApplicationNameDescriptor {
    pub fn new(names: Vec<ApplicationName>) -> Self {
        ApplicationNameDescriptor {
            names,
            state: DecodeState::Valid,
        }
    }
}

impl TypedDescriptor for ApplicationNameDescriptor {
    fn edid(&self) -> Edid {
        Edid::TableSpecific {
            tag: TAG,
            table_id: AIT_TABLE_ID,
        }
    }

    fn xml_name(&self) -> &'static str {
        XML_NAME
    }

    fn state(&self) -> DecodeState {
        self.state
    }

    fn clear(&mut self) {
        self.names.clear();
        self.state = DecodeState::Empty;
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, ctx: &Context<'_>) {
        for entry in &self.names {
            buf.put_language_code(entry.language);
            buf.put_string_with_byte_length(&entry.name, ctx.default_charset());
        }
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        while buf.can_read() {
            self.names.push(ApplicationName {
                language: buf.get_language_code(),
                name: buf.get_string_with_byte_length(ctx.default_charset()),
            });
        }
        self.state = if buf.ok() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
    }

    fn build_xml(&self, _ctx: &Context<'_>) -> Element {
        let mut element = Element::new(XML_NAME);
        for entry in &self.names {
            let mut child = Element::new("application_name");
            child.set_attr("language_code", entry.language.as_str());
            child.set_attr("name", &entry.name);
            element.add_child(child);
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
        self.names.iter().map(|n| n.language).collect()
    }
}

impl ApplicationNameDescriptor {
    fn analyze_xml_fields(&mut self, element: &Element) -> Result<(), XmlError> {
        for child in element.children_named("application_name") {
            self.names.push(ApplicationName {
                language: child.language_attr("language_code")?,
                name: child.req_attr("name")?.to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        edid: Edid::TableSpecific {
            tag: TAG,
            table_id: AIT_TABLE_ID,
        },
        factory: || Box::new(ApplicationNameDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &[],
    }
}
