//! logical_channel_number_descriptor (EACEM private tag 0x83): a loop of
//! service id, visibility flag and a 10-bit channel number straddling a
//! byte boundary.
//!
//! The tag lives in the private range and means this only while the EACEM
//! private-data specifier is in scope; in any other vendor scope it is an
//! unknown descriptor.

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::Edid;
use crate::err::XmlError;
use crate::registry::Registration;
use crate::traits::{DecodeState, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = 0x83;

/// Private-data specifier of the EACEM / E-Book industry group.
pub const EACEM_PDS: u32 = 0x0000_0028;

const XML_NAME: &str = "logical_channel_number_descriptor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcnEntry {
    pub service_id: u16,
    pub visible: bool,
    /// 10 bits on the wire.
    pub lcn: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalChannelNumberDescriptor {
    pub entries: Vec<LcnEntry>,
    state: DecodeState,
}

impl LogicalChannelNumberDescriptor {
    pub fn new(entries: Vec<LcnEntry>) -> Self {
        LogicalChannelNumberDescriptor {
            entries,
            state: DecodeState::Valid,
        }
    }
}

impl TypedDescriptor for LogicalChannelNumberDescriptor {
    fn edid(&self) -> Edid {
        Edid::Private {
            tag: TAG,
            pds: EACEM_PDS,
        }
    }

    fn xml_name(&self) -> &'static str {
        XML_NAME
    }

    fn state(&self) -> DecodeState {
        self.state
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.state = DecodeState::Empty;
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        for entry in &self.entries {
            buf.put_u16(entry.service_id);
            buf.put_bits(u64::from(entry.visible), 1);
            buf.put_bits(0x1F, 5); // reserved
            buf.put_bits(entry.lcn.into(), 10);
        }
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        while buf.can_read() {
            let service_id = buf.get_u16();
            let visible = buf.get_bits(1) == 1;
            buf.skip_bits(5);
            let lcn = buf.get_bits(10) as u16;
            self.entries.push(LcnEntry {
                service_id,
                visible,
                lcn,
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
        for entry in &self.entries {
            let mut child = Element::new("service");
            child.set_hex_attr("service_id", entry.service_id.into(), 4);
            child.set_attr("logical_channel_number", entry.lcn.to_string());
            child.set_bool_attr("visible_service", entry.visible);
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
}

impl LogicalChannelNumberDescriptor {
    fn analyze_xml_fields(&mut self, element: &Element) -> Result<(), XmlError> {
        for child in element.children_named("service") {
            self.entries.push(LcnEntry {
                service_id: child.u16_attr("service_id")?,
                lcn: child.u16_attr_in("logical_channel_number", 0, 0x3FF)?,
                visible: match child.attr("visible_service") {
                    Some(_) => child.bool_attr("visible_service")?,
                    None => true,
                },
            });
        }
        Ok(())
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        edid: Edid::Private {
            tag: TAG,
            pds: EACEM_PDS,
        },
        factory: || Box::new(LogicalChannelNumberDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &["eacem_logical_channel_number_descriptor"],
    }
}
