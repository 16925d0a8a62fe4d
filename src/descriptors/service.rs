//! service_descriptor (DVB): service type plus provider and service names,
//! each behind a one-byte length prefix.

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::Edid;
use crate::err::XmlError;
use crate::registry::Registration;
use crate::standards::Standards;
use crate::traits::{DecodeState, DuplicationMode, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = 0x48;
const XML_NAME: &str = "service_descriptor";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub service_type: u8,
    pub provider_name: String,
    pub service_name: String,
    state: DecodeState,
}

impl ServiceDescriptor {
    pub fn new(
        service_type: u8,
        provider_name: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        ServiceDescriptor {
            service_type,
            provider_name: provider_name.into(),
            service_name: service_name.into(),
            state: DecodeState::Valid,
        }
    }
}

impl TypedDescriptor for ServiceDescriptor {
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
        self.service_type = 0;
        self.provider_name.clear();
        self.service_name.clear();
        self.state = DecodeState::Empty;
    }

    fn duplication_mode(&self) -> DuplicationMode {
        DuplicationMode::Replace
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, ctx: &Context<'_>) {
        let charset = ctx.default_charset();
        buf.put_u8(self.service_type);
        buf.put_string_with_byte_length(&self.provider_name, charset);
        buf.put_string_with_byte_length(&self.service_name, charset);
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        let charset = ctx.default_charset();
        self.service_type = buf.get_u8();
        self.provider_name = buf.get_string_with_byte_length(charset);
        self.service_name = buf.get_string_with_byte_length(charset);
        // The layout is fixed; unconsumed bytes mean the payload is not a
        // service_descriptor.
        self.state = if buf.ok() && !buf.can_read() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
    }

    fn build_xml(&self, _ctx: &Context<'_>) -> Element {
        let mut element = Element::new(XML_NAME);
        element.set_hex_attr("service_type", self.service_type.into(), 2);
        element.set_attr("service_provider_name", &self.provider_name);
        element.set_attr("service_name", &self.service_name);
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

impl ServiceDescriptor {
    fn analyze_xml_fields(&mut self, element: &Element) -> Result<(), XmlError> {
        self.service_type = element.u8_attr("service_type")?;
        self.provider_name = element.req_attr("service_provider_name")?.to_string();
        self.service_name = element.req_attr("service_name")?.to_string();
        Ok(())
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        edid: Edid::Standard {
            tag: TAG,
            standards: Standards::DVB,
        },
        factory: || Box::new(ServiceDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wire_layout_prefixes_both_names() {
        let ctx = Context::default();
        let desc = ServiceDescriptor::new(0x01, "BBC", "BBC One");
        let mut buf = PsiBuffer::for_write(64);
        desc.serialize_payload(&mut buf, &ctx);
        assert_eq!(buf.written(), b"\x01\x03BBC\x07BBC One");
    }

    #[test]
    fn trailing_bytes_invalidate_the_decode() {
        let ctx = Context::default();
        let mut desc = ServiceDescriptor::default();
        let mut buf = PsiBuffer::for_read(b"\x01\x00\x00\xFF");
        desc.deserialize_payload(&mut buf, &ctx);
        assert!(!desc.is_valid());
    }

    #[test]
    fn truncated_name_invalidates_but_keeps_earlier_fields() {
        let ctx = Context::default();
        let mut desc = ServiceDescriptor::default();
        // The provider length promises more bytes than the payload has.
        let mut buf = PsiBuffer::for_read(b"\x19\x05ab");
        desc.deserialize_payload(&mut buf, &ctx);
        assert!(!desc.is_valid());
        assert_eq!(desc.service_type, 0x19);
    }
}
