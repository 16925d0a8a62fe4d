//! Process-wide repository of known descriptor types.
//!
//! Registration happens single-threaded during application start-up, one
//! explicit call per variant; lookups afterwards are read-only and need no
//! synchronization. Registering after lookups have begun is prevented by
//! the host's initialization order, not by this module.

use std::sync::OnceLock;

use hashbrown::HashMap;
use log::debug;

use crate::edid::{DVB_EXTENSION_TAG, DecodeContext, Edid, FIRST_PRIVATE_TAG};
use crate::err::RegistryError;
use crate::standards::Standards;
use crate::traits::DescriptorFactory;

/// What to do when the active standards set intersects more than one
/// standard-qualified registration for the same tag.
///
/// Registrations with overlapping sets are rejected outright, so this can
/// only happen when the *active* set spans two disjoint registrations
/// (e.g. ATSC and ISDB both active for a tag each defines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardsAmbiguity {
    /// Skip the standard-qualified level entirely and continue with the
    /// bare-tag fallback; without one the tag decodes as opaque.
    #[default]
    Fallback,
    /// Use whichever matching factory was registered first.
    FirstRegistered,
}

/// One start-up registration: identity, factory, XML names.
pub struct Registration {
    pub edid: Edid,
    pub factory: DescriptorFactory,
    pub xml_name: &'static str,
    pub legacy_xml_names: &'static [&'static str],
}

struct Entry {
    edid: Edid,
    factory: DescriptorFactory,
    xml_name: &'static str,
}

#[derive(Default)]
struct TagEntry {
    /// By containing table id.
    table_specific: HashMap<u8, Entry>,
    /// By private-data specifier.
    private: HashMap<u32, Entry>,
    /// By `tag_extension` byte.
    extension: HashMap<u8, Entry>,
    /// Standard-qualified; sets are pairwise disjoint, registration order
    /// preserved.
    standard: Vec<Entry>,
    /// Unconditional fallback.
    regular: Option<Entry>,
}

pub struct Registry {
    tags: HashMap<u8, TagEntry>,
    xml_names: HashMap<String, DescriptorFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            tags: HashMap::new(),
            xml_names: HashMap::new(),
        }
    }

    /// The shared instance with every built-in variant registered.
    ///
    /// A registration conflict among built-ins is a defect in this crate,
    /// not in any input, and aborts on first use.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let mut registry = Registry::new();
            crate::descriptors::register_all(&mut registry)
                .expect("built-in descriptor registrations conflict");
            registry
        })
    }

    /// Registers one descriptor type. Rejects anything that could tie with
    /// an existing registration at the same precedence level.
    pub fn register(&mut self, registration: Registration) -> Result<(), RegistryError> {
        let Registration {
            edid,
            factory,
            xml_name,
            legacy_xml_names,
        } = registration;
        debug!("registering descriptor {edid} as <{xml_name}>");

        let entry = Entry {
            edid,
            factory,
            xml_name,
        };
        let tag_entry = self.tags.entry(edid.tag()).or_default();

        match edid {
            Edid::TableSpecific { table_id, .. } => {
                if tag_entry.table_specific.contains_key(&table_id) {
                    return Err(RegistryError::DuplicateEdid { edid });
                }
                tag_entry.table_specific.insert(table_id, entry);
            }
            Edid::Private { pds, .. } => {
                if tag_entry.private.contains_key(&pds) {
                    return Err(RegistryError::DuplicateEdid { edid });
                }
                tag_entry.private.insert(pds, entry);
            }
            Edid::Extension { ext, .. } => {
                if tag_entry.extension.contains_key(&ext) {
                    return Err(RegistryError::DuplicateEdid { edid });
                }
                tag_entry.extension.insert(ext, entry);
            }
            Edid::Standard { tag, standards } => {
                for existing in &tag_entry.standard {
                    if let Edid::Standard {
                        standards: present, ..
                    } = existing.edid
                        && present.intersects(standards)
                    {
                        return Err(RegistryError::OverlappingStandards { tag });
                    }
                }
                tag_entry.standard.push(entry);
            }
            Edid::Regular { .. } => {
                if tag_entry.regular.is_some() {
                    return Err(RegistryError::DuplicateEdid { edid });
                }
                tag_entry.regular = Some(entry);
            }
        }

        for name in std::iter::once(xml_name).chain(legacy_xml_names.iter().copied()) {
            if self.xml_names.contains_key(name) {
                return Err(RegistryError::DuplicateXmlName {
                    name: name.to_string(),
                });
            }
            self.xml_names.insert(name.to_string(), factory);
        }
        Ok(())
    }

    /// Factory for an XML element name, canonical or legacy.
    pub fn lookup_by_xml_name(&self, name: &str) -> Option<DescriptorFactory> {
        self.xml_names.get(name).copied()
    }

    /// Context-sensitive factory lookup, most specific first:
    /// extension pair, containing table, vendor scope, active standards,
    /// bare tag. `None` means unknown (the caller falls back to the opaque
    /// holder).
    pub fn lookup_factory(
        &self,
        tag: u8,
        payload: &[u8],
        dctx: &DecodeContext,
        standards: Standards,
        ambiguity: StandardsAmbiguity,
    ) -> Option<DescriptorFactory> {
        self.lookup_entry(tag, payload, dctx, standards, ambiguity)
            .map(|e| e.factory)
    }

    fn lookup_entry(
        &self,
        tag: u8,
        payload: &[u8],
        dctx: &DecodeContext,
        standards: Standards,
        ambiguity: StandardsAmbiguity,
    ) -> Option<&Entry> {
        let tag_entry = self.tags.get(&tag)?;

        // An extension tag is a namespace of its own: the pair either is
        // registered or the descriptor is unknown.
        if let Some(&ext) = payload.first()
            && let Some(entry) = tag_entry.extension.get(&ext)
        {
            return Some(entry);
        }
        if tag == DVB_EXTENSION_TAG {
            return None;
        }

        if let Some(table_id) = dctx.table_id
            && let Some(entry) = tag_entry.table_specific.get(&table_id)
        {
            return Some(entry);
        }

        // Inside a vendor scope, a private-range tag belongs to that
        // vendor; an unregistered pair never falls through to a standard
        // meaning.
        if tag >= FIRST_PRIVATE_TAG
            && let Some(pds) = dctx.pds
        {
            return tag_entry.private.get(&pds);
        }

        let mut matching = tag_entry
            .standard
            .iter()
            .filter(|e| matches!(e.edid, Edid::Standard { standards: s, .. } if s.intersects(standards)));
        if let Some(first) = matching.next() {
            let unambiguous = matching.next().is_none();
            if unambiguous || ambiguity == StandardsAmbiguity::FirstRegistered {
                return Some(first);
            }
        }

        tag_entry.regular.as_ref()
    }

    /// The identity under which a raw descriptor would be matched in the
    /// given context: the registered identity when one exists, otherwise
    /// the most specific wire identity (extension pair or vendor pair),
    /// otherwise the bare tag.
    pub fn resolve_edid(
        &self,
        tag: u8,
        payload: &[u8],
        dctx: &DecodeContext,
        standards: Standards,
        ambiguity: StandardsAmbiguity,
    ) -> Edid {
        if tag == DVB_EXTENSION_TAG
            && let Some(&ext) = payload.first()
        {
            return Edid::Extension { tag, ext };
        }
        if let Some(entry) = self.lookup_entry(tag, payload, dctx, standards, ambiguity) {
            return entry.edid;
        }
        if tag >= FIRST_PRIVATE_TAG
            && let Some(pds) = dctx.pds
        {
            return Edid::Private { tag, pds };
        }
        Edid::Regular { tag }
    }

    pub fn registered_edids(&self) -> Vec<Edid> {
        let mut edids = Vec::new();
        for tag_entry in self.tags.values() {
            edids.extend(tag_entry.table_specific.values().map(|e| e.edid));
            edids.extend(tag_entry.private.values().map(|e| e.edid));
            edids.extend(tag_entry.extension.values().map(|e| e.edid));
            edids.extend(tag_entry.standard.iter().map(|e| e.edid));
            edids.extend(tag_entry.regular.iter().map(|e| e.edid));
        }
        edids
    }

    pub fn registered_xml_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.xml_names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
