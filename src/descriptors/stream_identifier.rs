//! stream_identifier_descriptor (DVB): a single component tag. At most one
//! per elementary stream, so duplicates are ignored.

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::Edid;
use crate::err::XmlError;
use crate::registry::Registration;
use crate::standards::Standards;
use crate::traits::{DecodeState, DuplicationMode, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = 0x52;
const XML_NAME: &str = "stream_identifier_descriptor";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamIdentifierDescriptor {
    pub component_tag: u8,
    state: DecodeState,
}

impl StreamIdentifierDescriptor {
    pub fn new(component_tag: u8) -> Self {
        StreamIdentifierDescriptor {
            component_tag,
            state: DecodeState::Valid,
        }
    }
}

impl TypedDescriptor for StreamIdentifierDescriptor {
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
        self.component_tag = 0;
        self.state = DecodeState::Empty;
    }

    fn duplication_mode(&self) -> DuplicationMode {
        DuplicationMode::Ignore
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        buf.put_u8(self.component_tag);
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        self.component_tag = buf.get_u8();
        self.state = if buf.ok() && !buf.can_read() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
    }

    fn build_xml(&self, _ctx: &Context<'_>) -> Element {
        let mut element = Element::new(XML_NAME);
        element.set_hex_attr("component_tag", self.component_tag.into(), 2);
        element
    }

    fn analyze_xml(&mut self, element: &Element, _ctx: &Context<'_>) -> Result<(), XmlError> {
        self.clear();
        self.state = DecodeState::Decoding;
        match element.u8_attr("component_tag") {
            Ok(tag) => {
                self.component_tag = tag;
                self.state = DecodeState::Valid;
                Ok(())
            }
            Err(e) => {
                self.state = DecodeState::Invalid;
                Err(e)
            }
        }
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        edid: Edid::Standard {
            tag: TAG,
            standards: Standards::DVB,
        },
        factory: || Box::new(StreamIdentifierDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &[],
    }
}
