use byteorder::{BigEndian, ByteOrder};
use log::{debug, error};

use crate::buffer::PsiBuffer;
use crate::context::Context;
use crate::descriptor::{Descriptor, OPAQUE_XML_NAME, OpaqueDescriptor};
use crate::edid::{DecodeContext, Edid, FIRST_PRIVATE_TAG, PRIVATE_DATA_SPECIFIER_TAG};
use crate::err::XmlError;
use crate::lang::LanguageCode;
use crate::traits::{DuplicationMode, TypedDescriptor};
use crate::xml::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    desc: Descriptor,
    /// Private-data specifier in scope at this position.
    pds: Option<u32>,
}

/// An ordered sequence of raw descriptors, as carried in one table loop.
///
/// Each entry remembers the vendor scope established by any preceding
/// `private_data_specifier_descriptor`, and the list knows the id of its
/// owning table; together these let every entry's identity be resolved
/// later. Insertion order is preserved, except that the duplication
/// policies `Replace` and `Merge` overwrite a matching entry in place.
///
/// A list is logically owned by one assembler at a time; it has no
/// internal synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorList {
    table_id: Option<u8>,
    entries: Vec<Entry>,
}

impl DescriptorList {
    pub fn new() -> Self {
        DescriptorList::default()
    }

    /// A list owned by the table with the given id.
    pub fn for_table(table_id: u8) -> Self {
        DescriptorList {
            table_id: Some(table_id),
            entries: Vec::new(),
        }
    }

    pub fn table_id(&self) -> Option<u8> {
        self.table_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Descriptor> {
        self.entries.get(index).map(|e| &e.desc)
    }

    /// Vendor scope at the given position.
    pub fn pds_at(&self, index: usize) -> Option<u32> {
        self.entries.get(index).and_then(|e| e.pds)
    }

    fn decode_context_at(&self, index: usize) -> DecodeContext {
        DecodeContext {
            table_id: self.table_id,
            pds: self.pds_at(index),
        }
    }

    fn current_pds(&self) -> Option<u32> {
        self.entries.last().and_then(|e| e.pds)
    }

    /// Appends one raw descriptor, maintaining the vendor scope. Invalid
    /// descriptors are refused.
    pub fn push(&mut self, desc: Descriptor) -> bool {
        if !desc.is_valid() {
            return false;
        }
        let pds = if desc.tag() == PRIVATE_DATA_SPECIFIER_TAG {
            // This descriptor establishes a new scope, starting with
            // itself. A short payload clears the scope.
            (desc.payload_size() >= 4).then(|| BigEndian::read_u32(&desc.payload()[..4]))
        } else {
            self.current_pds()
        };
        self.entries.push(Entry { desc, pds });
        true
    }

    /// Appends every well-delimited record in `data`. Returns false when
    /// trailing bytes do not form a complete record (whatever parsed
    /// before them is kept).
    pub fn add_bytes(&mut self, data: &[u8]) -> bool {
        let mut rest = data;
        while rest.len() >= 2 {
            let size = rest[1] as usize + 2;
            if size > rest.len() {
                break;
            }
            self.push(Descriptor::from_bytes(&rest[..size]));
            rest = &rest[size..];
        }
        rest.is_empty()
    }

    /// Inserts a typed descriptor according to its duplication policy.
    ///
    /// The instance is serialized, its identity resolved, and the latest
    /// entry with an equal resolved identity located. No match, or policy
    /// `Add`: append. `Ignore`: the new descriptor is discarded. `Replace`:
    /// the matching entry's bytes are overwritten in place. `Merge`: the
    /// matching entry is decoded into the same concrete type, merged and
    /// re-serialized in place, falling back to a plain append when it
    /// cannot be decoded.
    ///
    /// Returns false only when the instance does not serialize to a valid
    /// descriptor.
    pub fn add(&mut self, ctx: &Context<'_>, typed: &dyn TypedDescriptor) -> bool {
        let bin = Descriptor::from_typed(typed, ctx);
        if !bin.is_valid() {
            return false;
        }
        let mode = typed.duplication_mode();
        if mode != DuplicationMode::Add
            && let Some(index) = self.rsearch_edid(ctx, typed.edid())
        {
            match mode {
                DuplicationMode::Ignore => {
                    debug!("ignoring duplicate {}", typed.edid());
                    return true;
                }
                DuplicationMode::Replace => {
                    self.entries[index].desc = bin;
                    return true;
                }
                DuplicationMode::Merge => {
                    if let Some(merged) = self.merge_in_place(ctx, typed, index) {
                        self.entries[index].desc = merged;
                        return true;
                    }
                    // The existing entry could not be decoded or the merge
                    // did not serialize: keep it and append the newcomer.
                }
                DuplicationMode::Add => unreachable!("filtered above"),
            }
        }
        self.append_typed(typed.edid(), bin);
        true
    }

    fn merge_in_place(
        &self,
        ctx: &Context<'_>,
        typed: &dyn TypedDescriptor,
        index: usize,
    ) -> Option<Descriptor> {
        let existing = &self.entries[index].desc;
        let ext = typed.edid().extension();
        let body = match ext {
            Some(_) => existing.payload().get(1..).unwrap_or_default(),
            None => existing.payload(),
        };
        let merged = typed.merge_serialized(body, ctx)?;
        let rebuilt = match ext {
            Some(ext) => {
                let mut payload = Vec::with_capacity(merged.len() + 1);
                payload.push(ext);
                payload.extend_from_slice(&merged);
                Descriptor::from_tag_payload(typed.tag(), &payload)
            }
            None => Descriptor::from_tag_payload(typed.tag(), &merged),
        };
        rebuilt.is_valid().then_some(rebuilt)
    }

    fn append_typed(&mut self, edid: Edid, bin: Descriptor) {
        // A vendor-private descriptor needs its specifier in scope; insert
        // one when the tail scope differs.
        if let Edid::Private { pds, .. } = edid
            && self.current_pds() != Some(pds)
        {
            let mut payload = [0u8; 4];
            BigEndian::write_u32(&mut payload, pds);
            self.push(Descriptor::from_tag_payload(
                PRIVATE_DATA_SPECIFIER_TAG,
                &payload,
            ));
        }
        self.push(bin);
    }

    /// Latest entry whose resolved identity equals `edid`.
    fn rsearch_edid(&self, ctx: &Context<'_>, edid: Edid) -> Option<usize> {
        // A table-specific identity cannot match inside another table; an
        // unknown owning table is assumed to match.
        if let Some(table_id) = edid.table_id()
            && let Some(own) = self.table_id
            && own != table_id
        {
            return None;
        }
        (0..self.entries.len()).rev().find(|&i| {
            let entry = &self.entries[i];
            entry
                .desc
                .resolve_edid(ctx, &self.decode_context_at(i)) == edid
        })
    }

    /// First entry with the given wire tag, from `start`.
    pub fn search_tag(&self, tag: u8, start: usize) -> Option<usize> {
        (start..self.entries.len()).find(|&i| self.entries[i].desc.tag() == tag)
    }

    /// Removes one entry. A `private_data_specifier_descriptor` that still
    /// scopes following private descriptors is refused; otherwise the
    /// scope of the entries it covered reverts to the preceding one.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        if self.entries[index].desc.tag() == PRIVATE_DATA_SPECIFIER_TAG {
            let mut end = index + 1;
            while end < self.entries.len()
                && self.entries[end].desc.tag() != PRIVATE_DATA_SPECIFIER_TAG
            {
                if self.entries[end].desc.tag() >= FIRST_PRIVATE_TAG {
                    return false;
                }
                end += 1;
            }
            let previous = if index == 0 {
                None
            } else {
                self.entries[index - 1].pds
            };
            for entry in &mut self.entries[index + 1..end] {
                entry.pds = previous;
            }
        }
        self.entries.remove(index);
        true
    }

    /// Total serialized size of every entry.
    pub fn binary_size(&self) -> usize {
        self.entries.iter().map(|e| e.desc.size()).sum()
    }

    /// Writes entries in order while they fit; returns how many were
    /// written.
    pub fn serialize(&self, buf: &mut PsiBuffer) -> usize {
        for (count, entry) in self.entries.iter().enumerate() {
            if !buf.can_write_bytes(entry.desc.size()) {
                return count;
            }
            buf.put_bytes(entry.desc.as_bytes());
        }
        self.entries.len()
    }

    /// Writes a 16-bit field of `16 - length_bits` reserved bits and a
    /// `length_bits`-bit byte length, then as many whole entries as fit
    /// both the buffer and the length field. Returns how many were
    /// written.
    pub fn serialize_with_length(
        &self,
        buf: &mut PsiBuffer,
        reserved: u16,
        length_bits: usize,
    ) -> usize {
        let length_bits = length_bits.min(16);
        let max_length = (1usize << length_bits) - 1;

        let mut total = 0usize;
        let mut count = 0usize;
        for entry in &self.entries {
            let next = total + entry.desc.size();
            if next > max_length || !buf.can_write_bytes(2 + next) {
                break;
            }
            total = next;
            count += 1;
        }

        buf.put_bits(u64::from(reserved), 16 - length_bits);
        buf.put_bits(total as u64, length_bits);
        for entry in &self.entries[..count] {
            buf.put_bytes(entry.desc.as_bytes());
        }
        count
    }

    /// Decodes the entry at `index`; unknown tags come back opaque.
    pub fn decode_at(
        &self,
        ctx: &Context<'_>,
        index: usize,
    ) -> Option<Box<dyn TypedDescriptor>> {
        let entry = self.entries.get(index)?;
        Some(entry.desc.decode(ctx, &self.decode_context_at(index)))
    }

    /// Language codes of every decodable entry, concatenated in list
    /// order, capped at `max` when given.
    pub fn all_languages(&self, ctx: &Context<'_>, max: Option<usize>) -> Vec<LanguageCode> {
        let mut codes = Vec::new();
        for index in 0..self.entries.len() {
            let typed = self.entries[index]
                .desc
                .decode(ctx, &self.decode_context_at(index));
            if !typed.is_valid() {
                continue;
            }
            for code in typed.languages() {
                if max.is_some_and(|m| codes.len() >= m) {
                    return codes;
                }
                codes.push(code);
            }
        }
        codes
    }

    /// Index of the first entry whose languages contain `code`,
    /// case-insensitively.
    pub fn search_language(&self, ctx: &Context<'_>, code: &str) -> Option<usize> {
        (0..self.entries.len()).find(|&index| {
            let typed = self.entries[index]
                .desc
                .decode(ctx, &self.decode_context_at(index));
            typed.is_valid()
                && typed
                    .languages()
                    .iter()
                    .any(|c| c.matches_ignore_case(code))
        })
    }

    /// One element per entry: the typed form when the entry decodes, the
    /// opaque hex form otherwise, so nothing is dropped.
    pub fn to_xml(&self, ctx: &Context<'_>) -> Vec<Element> {
        (0..self.entries.len())
            .map(|index| {
                let entry = &self.entries[index];
                let typed = entry.desc.decode(ctx, &self.decode_context_at(index));
                if typed.is_valid() {
                    typed.build_xml(ctx)
                } else {
                    OpaqueDescriptor::from_descriptor(&entry.desc).build_xml(ctx)
                }
            })
            .collect()
    }

    /// Analyzes a sequence of descriptor elements and appends the results
    /// in document order. Elements are taken literally (duplication
    /// policies do not apply on input, so documents round-trip
    /// byte-exactly). A failing element is reported and skipped; its
    /// siblings still load. Returns whether every element loaded.
    pub fn from_xml(&mut self, ctx: &Context<'_>, elements: &[Element]) -> bool {
        let mut success = true;
        for element in elements {
            match self.one_from_xml(ctx, element) {
                Ok(desc) => {
                    self.push(desc);
                }
                Err(e) => {
                    error!("{e}");
                    success = false;
                }
            }
        }
        success
    }

    fn one_from_xml(
        &mut self,
        ctx: &Context<'_>,
        element: &Element,
    ) -> Result<Descriptor, XmlError> {
        let typed: Box<dyn TypedDescriptor> = if element.name() == OPAQUE_XML_NAME {
            let mut opaque = OpaqueDescriptor::default();
            opaque.analyze_xml(element, ctx)?;
            Box::new(opaque)
        } else {
            let factory = ctx.registry().lookup_by_xml_name(element.name()).ok_or(
                XmlError::UnknownElement {
                    element: element.name().to_string(),
                    line: element.line(),
                },
            )?;
            let mut typed = factory();
            typed.analyze_xml(element, ctx)?;
            typed
        };
        let desc = Descriptor::from_typed(&*typed, ctx);
        if !desc.is_valid() {
            return Err(XmlError::InvalidContent {
                element: element.name().to_string(),
                line: element.line(),
            });
        }
        Ok(desc)
    }
}
