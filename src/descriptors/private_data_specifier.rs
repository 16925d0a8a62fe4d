//! private_data_specifier_descriptor (DVB): a 32-bit vendor identifier.
//!
//! Beyond its trivial payload this descriptor has list-level semantics: it
//! opens a vendor scope for every following descriptor in the same loop,
//! which is how private-range tags get their meaning resolved. The scope
//! tracking itself lives in [`DescriptorList`](crate::DescriptorList).

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::{Edid, PRIVATE_DATA_SPECIFIER_TAG};
use crate::err::XmlError;
use crate::registry::Registration;
use crate::standards::Standards;
use crate::traits::{DecodeState, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = PRIVATE_DATA_SPECIFIER_TAG;
const XML_NAME: &str = "private_data_specifier_descriptor";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateDataSpecifierDescriptor {
    pub pds: u32,
    state: DecodeState,
}

impl PrivateDataSpecifierDescriptor {
    pub fn new(pds: u32) -> Self {
        PrivateDataSpecifierDescriptor {
            pds,
            state: DecodeState::Valid,
        }
    }
}

impl TypedDescriptor for PrivateDataSpecifierDescriptor {
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
        self.pds = 0;
        self.state = DecodeState::Empty;
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        buf.put_u32(self.pds);
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        self.pds = buf.get_u32();
        self.state = if buf.ok() && !buf.can_read() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
    }

    fn build_xml(&self, _ctx: &Context<'_>) -> Element {
        let mut element = Element::new(XML_NAME);
        element.set_hex_attr("private_data_specifier", self.pds.into(), 8);
        element
    }

    fn analyze_xml(&mut self, element: &Element, _ctx: &Context<'_>) -> Result<(), XmlError> {
        self.clear();
        self.state = DecodeState::Decoding;
        match element.u32_attr("private_data_specifier") {
            Ok(pds) => {
                self.pds = pds;
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
        factory: || Box::new(PrivateDataSpecifierDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &[],
    }
}
