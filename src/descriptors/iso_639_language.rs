//! ISO_639_language_descriptor (MPEG-2 Systems): one audio-type entry per
//! language, repeated to the end of the payload.

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::Edid;
use crate::err::XmlError;
use crate::lang::LanguageCode;
use crate::registry::Registration;
use crate::standards::Standards;
use crate::traits::{DecodeState, DuplicationMode, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = 0x0A;
const XML_NAME: &str = "ISO_639_language_descriptor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    pub language: LanguageCode,
    pub audio_type: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Iso639LanguageDescriptor {
    pub entries: Vec<LanguageEntry>,
    state: DecodeState,
}

impl Iso639LanguageDescriptor {
    pub fn new(entries: Vec<LanguageEntry>) -> Self {
        Iso639LanguageDescriptor {
            entries,
            state: DecodeState::Valid,
        }
    }

    /// Combines another instance into this one: an incoming entry replaces
    /// the existing entry with the same language code in place, otherwise
    /// it is appended. Idempotent; order is preserved.
    pub fn merge(&mut self, other: &Self) {
        for incoming in &other.entries {
            match self
                .entries
                .iter_mut()
                .find(|e| e.language == incoming.language)
            {
                Some(existing) => *existing = *incoming,
                None => self.entries.push(*incoming),
            }
        }
    }
}

impl TypedDescriptor for Iso639LanguageDescriptor {
    fn edid(&self) -> Edid {
        Edid::Standard {
            tag: TAG,
            standards: Standards::MPEG,
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

    fn duplication_mode(&self) -> DuplicationMode {
        DuplicationMode::Merge
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        for entry in &self.entries {
            buf.put_language_code(entry.language);
            buf.put_u8(entry.audio_type);
        }
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        while buf.can_read() {
            self.entries.push(LanguageEntry {
                language: buf.get_language_code(),
                audio_type: buf.get_u8(),
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
            let mut child = Element::new("language");
            child.set_attr("code", entry.language.as_str());
            child.set_hex_attr("audio_type", entry.audio_type.into(), 2);
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

    fn merge_serialized(&self, existing_payload: &[u8], ctx: &Context<'_>) -> Option<Vec<u8>> {
        let mut prior = Iso639LanguageDescriptor::default();
        let mut buf = PsiBuffer::for_read(existing_payload);
        prior.deserialize_payload(&mut buf, ctx);
        if !prior.is_valid() {
            return None;
        }
        prior.merge(self);

        let mut out = PsiBuffer::for_write(crate::descriptor::MAX_DESCRIPTOR_PAYLOAD);
        prior.serialize_payload(&mut out, ctx);
        out.ok().then(|| out.written().to_vec())
    }

    fn languages(&self) -> Vec<LanguageCode> {
        self.entries.iter().map(|e| e.language).collect()
    }
}

impl Iso639LanguageDescriptor {
    fn analyze_xml_fields(&mut self, element: &Element) -> Result<(), XmlError> {
        for child in element.children_named("language") {
            self.entries.push(LanguageEntry {
                language: child.language_attr("code")?,
                audio_type: child.u8_attr("audio_type")?,
            });
        }
        Ok(())
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        edid: Edid::Standard {
            tag: TAG,
            standards: Standards::MPEG,
        },
        factory: || Box::new(Iso639LanguageDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &[],
    }
}
