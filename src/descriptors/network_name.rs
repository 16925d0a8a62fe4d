//! network_name_descriptor (DVB): the whole payload is one character
//! string naming the delivery network.

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::Edid;
use crate::err::XmlError;
use crate::registry::Registration;
use crate::standards::Standards;
use crate::traits::{DecodeState, DuplicationMode, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = 0x40;
const XML_NAME: &str = "network_name_descriptor";

/// A NIT carries at most one meaningful network name, so a later one
/// replaces the earlier in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkNameDescriptor {
    pub name: String,
    state: DecodeState,
}

impl NetworkNameDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        NetworkNameDescriptor {
            name: name.into(),
            state: DecodeState::Valid,
        }
    }
}

impl TypedDescriptor for NetworkNameDescriptor {
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
        self.name.clear();
        self.state = DecodeState::Empty;
    }

    fn duplication_mode(&self) -> DuplicationMode {
        DuplicationMode::Replace
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, ctx: &Context<'_>) {
        buf.put_string(&self.name, ctx.default_charset());
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        self.name = buf.get_string(ctx.default_charset());
        self.state = if buf.ok() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
    }

    fn build_xml(&self, _ctx: &Context<'_>) -> Element {
        let mut element = Element::new(XML_NAME);
        element.set_attr("network_name", &self.name);
        element
    }

    fn analyze_xml(&mut self, element: &Element, _ctx: &Context<'_>) -> Result<(), XmlError> {
        self.clear();
        self.state = DecodeState::Decoding;
        match element.req_attr("network_name") {
            Ok(name) => {
                self.name = name.to_string();
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
        factory: || Box::new(NetworkNameDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &[],
    }
}
