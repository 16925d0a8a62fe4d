//! supplementary_audio_descriptor (DVB extension descriptor 0x7F,
//! tag_extension 0x06): mix type and editorial classification bit fields,
//! an optional language code and a private data blob.
//!
//! The framework owns the `tag_extension` byte; the codec here sees only
//! the body after it.

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::descriptor::MAX_DESCRIPTOR_PAYLOAD;
use crate::edid::{DVB_EXTENSION_TAG, Edid};
use crate::err::XmlError;
use crate::lang::LanguageCode;
use crate::registry::Registration;
use crate::traits::{DecodeState, DuplicationMode, TypedDescriptor};
use crate::xml::Element;

pub const TAG: u8 = DVB_EXTENSION_TAG;
pub const EXTENSION: u8 = 0x06;
const XML_NAME: &str = "supplementary_audio_descriptor";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplementaryAudioDescriptor {
    pub mix_type: u8,
    pub editorial_classification: u8,
    pub language: Option<LanguageCode>,
    pub private_data: Vec<u8>,
    state: DecodeState,
}

impl SupplementaryAudioDescriptor {
    pub fn new(mix_type: u8, editorial_classification: u8) -> Self {
        SupplementaryAudioDescriptor {
            mix_type,
            editorial_classification,
            language: None,
            private_data: Vec::new(),
            state: DecodeState::Valid,
        }
    }

    pub fn with_language(mut self, language: LanguageCode) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_private_data(mut self, data: Vec<u8>) -> Self {
        self.private_data = data;
        self
    }

    /// Combines another instance into this one: an unset language takes
    /// the incoming one, an empty private data blob takes the incoming
    /// blob, the mandatory scalar fields keep their existing values.
    /// Idempotent.
    pub fn merge(&mut self, other: &Self) {
        if self.language.is_none() {
            self.language = other.language;
        }
        if self.private_data.is_empty() {
            self.private_data = other.private_data.clone();
        }
    }
}

impl TypedDescriptor for SupplementaryAudioDescriptor {
    fn edid(&self) -> Edid {
        Edid::Extension {
            tag: TAG,
            ext: EXTENSION,
        }
    }

    fn xml_name(&self) -> &'static str {
        XML_NAME
    }

    fn state(&self) -> DecodeState {
        self.state
    }

    fn clear(&mut self) {
        *self = SupplementaryAudioDescriptor::default();
    }

    fn duplication_mode(&self) -> DuplicationMode {
        DuplicationMode::Merge
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        buf.put_bits(self.mix_type.into(), 1);
        buf.put_bits(self.editorial_classification.into(), 5);
        buf.put_bits(1, 1); // reserved_future_use
        buf.put_bits(u64::from(self.language.is_some()), 1);
        if let Some(language) = self.language {
            buf.put_language_code(language);
        }
        buf.put_bytes(&self.private_data);
    }

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, _ctx: &Context<'_>) {
        self.clear();
        self.state = DecodeState::Decoding;
        self.mix_type = buf.get_bits(1) as u8;
        self.editorial_classification = buf.get_bits(5) as u8;
        buf.skip_bits(1);
        let language_present = buf.get_bits(1) == 1;
        if language_present {
            self.language = Some(buf.get_language_code());
        }
        self.private_data = buf.remaining_bytes();
        self.state = if buf.ok() {
            DecodeState::Valid
        } else {
            DecodeState::Invalid
        };
    }

    fn build_xml(&self, _ctx: &Context<'_>) -> Element {
        let mut element = Element::new(XML_NAME);
        element.set_attr("mix_type", self.mix_type.to_string());
        element.set_hex_attr(
            "editorial_classification",
            self.editorial_classification.into(),
            2,
        );
        if let Some(language) = self.language {
            element.set_attr("language_code", language.as_str());
        }
        if !self.private_data.is_empty() {
            let mut child = Element::new("private_data");
            child.set_hex_text(&self.private_data);
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
        let mut prior = SupplementaryAudioDescriptor::default();
        let mut buf = PsiBuffer::for_read(existing_payload);
        prior.deserialize_payload(&mut buf, ctx);
        if !prior.is_valid() {
            return None;
        }
        prior.merge(self);

        let mut out = PsiBuffer::for_write(MAX_DESCRIPTOR_PAYLOAD);
        prior.serialize_payload(&mut out, ctx);
        out.ok().then(|| out.written().to_vec())
    }

    fn languages(&self) -> Vec<LanguageCode> {
        self.language.into_iter().collect()
    }
}

impl SupplementaryAudioDescriptor {
    fn analyze_xml_fields(&mut self, element: &Element) -> Result<(), XmlError> {
        self.mix_type = element.u8_attr_in("mix_type", 0, 1)?;
        self.editorial_classification = element.u8_attr_in("editorial_classification", 0, 31)?;
        self.language = element.opt_language_attr("language_code")?;
        if let Some(child) = element.children_named("private_data").next() {
            self.private_data = child.hex_text()?;
        }
        Ok(())
    }
}

pub(crate) fn registration() -> Registration {
    Registration {
        edid: Edid::Extension {
            tag: TAG,
            ext: EXTENSION,
        },
        factory: || Box::new(SupplementaryAudioDescriptor::default()),
        xml_name: XML_NAME,
        legacy_xml_names: &[],
    }
}
