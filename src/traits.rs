use std::fmt;

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::edid::Edid;
use crate::err::XmlError;
use crate::lang::LanguageCode;
use crate::xml::Element;

/// How a descriptor combines with an entry of the same resolved identity
/// that is already present in a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicationMode {
    /// Append unconditionally; multiple occurrences are normal.
    #[default]
    Add,
    /// Overwrite the previous occurrence in place.
    Replace,
    /// Discard the new descriptor.
    Ignore,
    /// Combine with the previous occurrence using a per-type rule.
    Merge,
}

/// Decode state of a typed descriptor instance.
///
/// Each decode attempt runs `Empty -> Decoding -> {Valid | Invalid}` and
/// the outcome is terminal for that attempt. An `Invalid` instance may
/// retain partially-filled fields for diagnostics but is never treated as
/// valid by the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeState {
    #[default]
    Empty,
    Decoding,
    Valid,
    Invalid,
}

/// Creates a fresh, empty instance of one concrete descriptor type.
pub type DescriptorFactory = fn() -> Box<dyn TypedDescriptor>;

/// The operation set every concrete descriptor variant implements.
///
/// Binary codecs are tolerant: `deserialize_payload` consumes what it can
/// from untrusted bytes and records the outcome in the instance state,
/// never panicking and never returning an error. The XML codec reports
/// schema violations through [`XmlError`] with the element name and source
/// line; a violation is local to that element.
///
/// For `Extension` identities the framework owns the `tag_extension`
/// byte: payload codecs see only the body after it.
pub trait TypedDescriptor: fmt::Debug {
    /// Fixed identity under which this type is registered.
    fn edid(&self) -> Edid;

    /// Canonical XML element name (legacy aliases live in the registry).
    fn xml_name(&self) -> &'static str;

    fn state(&self) -> DecodeState;

    fn is_valid(&self) -> bool {
        self.state() == DecodeState::Valid
    }

    fn tag(&self) -> u8 {
        self.edid().tag()
    }

    /// Resets every field and returns the instance to `Empty`.
    fn clear(&mut self);

    fn duplication_mode(&self) -> DuplicationMode {
        DuplicationMode::Add
    }

    fn serialize_payload(&self, buf: &mut PsiBuffer, ctx: &Context<'_>);

    fn deserialize_payload(&mut self, buf: &mut PsiBuffer, ctx: &Context<'_>);

    fn build_xml(&self, ctx: &Context<'_>) -> Element;

    fn analyze_xml(&mut self, element: &Element, ctx: &Context<'_>) -> Result<(), XmlError>;

    /// Merge-mode types only: decodes `existing_payload` into this same
    /// concrete type, merges `self` into it, and returns the re-serialized
    /// payload. `None` means the existing entry could not be decoded (the
    /// defensive type-mismatch case) and the caller falls back to a plain
    /// append. Extension bodies are passed and returned without the
    /// `tag_extension` byte.
    fn merge_serialized(&self, existing_payload: &[u8], ctx: &Context<'_>) -> Option<Vec<u8>> {
        let _ = (existing_payload, ctx);
        None
    }

    /// Language codes this descriptor reports, in field order. Most types
    /// report none.
    fn languages(&self) -> Vec<LanguageCode> {
        Vec::new()
    }
}
