use std::fmt;

use log::debug;

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::{DecodeContext, Edid};
use crate::err::XmlError;
use crate::traits::{DecodeState, TypedDescriptor};
use crate::utils::to_hex;
use crate::xml::Element;

/// Maximum payload of a wire descriptor (one-byte length field).
pub const MAX_DESCRIPTOR_PAYLOAD: usize = 255;

/// Maximum total size of a wire descriptor: tag, length, payload.
pub const MAX_DESCRIPTOR_SIZE: usize = MAX_DESCRIPTOR_PAYLOAD + 2;

/// XML element name of the opaque holder for unregistered tags.
pub const OPAQUE_XML_NAME: &str = "unknown_descriptor";

/// A raw binary descriptor: one owned tag-length-value record.
///
/// Created empty and invalid; valid once constructed with a payload within
/// wire bounds (0-255 bytes); immutable afterwards except by building a
/// whole replacement record. Meaning is a separate concern: resolving what
/// the tag denotes requires a [`DecodeContext`] and the registry.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Descriptor {
    /// Entire record (`tag`, `length`, payload), or empty when invalid.
    data: Vec<u8>,
}

impl Descriptor {
    pub fn new() -> Self {
        Descriptor::default()
    }

    /// Builds a record from a tag and payload. A payload over the wire
    /// bound yields an invalid descriptor.
    pub fn from_tag_payload(tag: u8, payload: &[u8]) -> Self {
        if payload.len() > MAX_DESCRIPTOR_PAYLOAD {
            return Descriptor::default();
        }
        let mut data = Vec::with_capacity(payload.len() + 2);
        data.push(tag);
        data.push(payload.len() as u8);
        data.extend_from_slice(payload);
        Descriptor { data }
    }

    /// Adopts a complete binary record. Anything that is not exactly one
    /// well-delimited record yields an invalid descriptor.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < 2 || bytes.len() != bytes[1] as usize + 2 {
            return Descriptor::default();
        }
        Descriptor {
            data: bytes.to_vec(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }

    /// The wire tag; 0 for an invalid descriptor.
    pub fn tag(&self) -> u8 {
        self.data.first().copied().unwrap_or(0)
    }

    pub fn payload(&self) -> &[u8] {
        if self.data.len() > 2 { &self.data[2..] } else { &[] }
    }

    pub fn payload_size(&self) -> usize {
        self.payload().len()
    }

    /// The complete record, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The identity this record would be matched under in the given
    /// context.
    pub fn resolve_edid(&self, ctx: &Context<'_>, dctx: &DecodeContext) -> Edid {
        ctx.resolve_edid(self.tag(), self.payload(), dctx)
    }

    /// Decodes into a typed instance. Unregistered tags come back as the
    /// opaque holder; registered tags with malformed payloads come back as
    /// instances in the `Invalid` state. Never fails.
    pub fn decode(&self, ctx: &Context<'_>, dctx: &DecodeContext) -> Box<dyn TypedDescriptor> {
        match ctx.lookup_factory(self.tag(), self.payload(), dctx) {
            Some(factory) => {
                let mut typed = factory();
                let body = match typed.edid() {
                    // The lookup matched on the extension byte; the codec
                    // sees only the body after it.
                    Edid::Extension { .. } => self.payload().get(1..).unwrap_or_default(),
                    _ => self.payload(),
                };
                let mut buf = PsiBuffer::for_read(body);
                typed.deserialize_payload(&mut buf, ctx);
                if !typed.is_valid() {
                    debug!(
                        "malformed payload for {} ({} bytes)",
                        typed.edid(),
                        body.len()
                    );
                }
                typed
            }
            None => Box::new(OpaqueDescriptor::from_descriptor(self)),
        }
    }

    /// Serializes a typed instance into a binary record. Invalid
    /// instances, oversized payloads and codecs that end off a byte
    /// boundary all yield an invalid descriptor.
    pub fn from_typed(typed: &dyn TypedDescriptor, ctx: &Context<'_>) -> Descriptor {
        if !typed.is_valid() {
            return Descriptor::default();
        }
        let mut buf = PsiBuffer::for_write(MAX_DESCRIPTOR_PAYLOAD);
        if let Edid::Extension { ext, .. } = typed.edid() {
            buf.put_u8(ext);
        }
        typed.serialize_payload(&mut buf, ctx);
        if !buf.ok() || !buf.write_is_byte_aligned() {
            return Descriptor::default();
        }
        Descriptor::from_tag_payload(typed.tag(), buf.written())
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(
                f,
                "Descriptor {{ tag: 0x{:02X}, payload: {} }}",
                self.tag(),
                to_hex(self.payload())
            )
        } else {
            f.write_str("Descriptor { invalid }")
        }
    }
}

/// Hex-preserving holder for tags nothing is registered for.
///
/// Decoding an unknown tag and re-serializing it reproduces the original
/// bytes, so editing round-trips are lossless even for descriptors this
/// build knows nothing about. The XML form is
/// `<unknown_descriptor tag="0xNN">HEX</unknown_descriptor>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpaqueDescriptor {
    pub tag: u8,
    pub payload: Vec<u8>,
    state: DecodeState,
}

impl OpaqueDescriptor {
    pub fn new(tag: u8, payload: Vec<u8>) -> Self {
        let state = if payload.len() <= MAX_DESCRIPTOR_PAYLOAD {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
        OpaqueDescriptor {
            tag,
            payload,
            state,
        }
    }

    pub fn from_descriptor(desc: &Descriptor) -> Self {
        OpaqueDescriptor::new(desc.tag(), desc.payload().to_vec())
    }
}

impl TypedDescriptor for OpaqueDescriptor {
    fn edid(&self) -> Edid {
        Edid::Regular { tag: self.tag }
    }

    fn xml_name(&self) -> &'static str {
        OPAQUE_XML_NAME
    }

    fn state(&self) -> DecodeState {
        self.state
    }

    fn clear(&mut self) {
        self.tag = 0;
        self.payload.clear();
        self.state = DecodeState::Empty;
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        buf.put_bytes(&self.payload);
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        // The tag is context the caller supplies; the payload is taken
        // verbatim, so this cannot fail.
        let tag = self.tag;
        self.clear();
        self.tag = tag;
        self.state = DecodeState::Decoding;
        self.payload = buf.remaining_bytes();
        self.state = if buf.ok() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
    }

    fn build_xml(&self, _ctx: &Context<'_>) -> Element {
        let mut element = Element::new(OPAQUE_XML_NAME);
        element.set_hex_attr("tag", self.tag.into(), 2);
        if !self.payload.is_empty() {
            element.set_hex_text(&self.payload);
        }
        element
    }

    fn analyze_xml(&mut self, element: &Element, _ctx: &Context<'_>) -> Result<(), XmlError> {
        self.clear();
        self.state = DecodeState::Decoding;
        match analyze_opaque(element) {
            Ok((tag, payload)) => {
                self.tag = tag;
                self.payload = payload;
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

fn analyze_opaque(element: &Element) -> Result<(u8, Vec<u8>), XmlError> {
    let tag = element.u8_attr("tag")?;
    let payload = if element.text().is_empty() {
        Vec::new()
    } else {
        element.hex_text()?
    };
    if payload.len() > MAX_DESCRIPTOR_PAYLOAD {
        return Err(XmlError::InvalidContent {
            element: element.name().to_string(),
            line: element.line(),
        });
    }
    Ok((tag, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_descriptor_is_invalid() {
        let desc = Descriptor::new();
        assert!(!desc.is_valid());
        assert_eq!(desc.tag(), 0);
        assert_eq!(desc.payload(), &[] as &[u8]);
    }

    #[test]
    fn payload_bounds_are_enforced() {
        assert!(Descriptor::from_tag_payload(0x48, &[0u8; 255]).is_valid());
        assert!(!Descriptor::from_tag_payload(0x48, &[0u8; 256]).is_valid());
        assert!(Descriptor::from_tag_payload(0x48, &[]).is_valid());
    }

    #[test]
    fn from_bytes_requires_a_well_delimited_record() {
        assert!(Descriptor::from_bytes(&[0x52, 0x01, 0x42]).is_valid());
        assert!(!Descriptor::from_bytes(&[0x52, 0x02, 0x42]).is_valid());
        assert!(!Descriptor::from_bytes(&[0x52]).is_valid());
        assert!(!Descriptor::from_bytes(&[]).is_valid());
    }

    #[test]
    fn unknown_tags_decode_to_the_opaque_holder_losslessly() {
        let ctx = Context::default();
        let desc = Descriptor::from_tag_payload(0xE9, &[0xDE, 0xAD, 0xBE]);
        let typed = desc.decode(&ctx, &DecodeContext::new());
        assert!(typed.is_valid());
        assert_eq!(typed.xml_name(), OPAQUE_XML_NAME);

        let back = Descriptor::from_typed(&*typed, &ctx);
        assert_eq!(back, desc);
    }

    #[test]
    fn opaque_xml_round_trip() {
        let ctx = Context::default();
        let opaque = OpaqueDescriptor::new(0xE9, vec![0x01, 0x02]);
        let element = opaque.build_xml(&ctx);

        let mut reparsed = OpaqueDescriptor::default();
        reparsed.analyze_xml(&element, &ctx).unwrap();
        assert_eq!(reparsed, opaque);
    }

    #[test]
    fn opaque_xml_requires_the_tag_attribute() {
        let ctx = Context::default();
        let element = Element::new(OPAQUE_XML_NAME);
        let mut opaque = OpaqueDescriptor::default();
        let err = opaque.analyze_xml(&element, &ctx).unwrap_err();
        assert!(matches!(err, XmlError::MissingAttribute { .. }));
        assert!(!opaque.is_valid());
    }
}
