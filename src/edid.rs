use std::fmt;

use crate::standards::Standards;

/// DVB extension descriptor tag; the payload's first byte is a secondary
/// `tag_extension` subdividing it.
pub const DVB_EXTENSION_TAG: u8 = 0x7F;

/// First tag of the vendor-private range. Tags at or above this value are
/// owned by whichever private-data specifier is in scope.
pub const FIRST_PRIVATE_TAG: u8 = 0x80;

/// Tag of the private_data_specifier_descriptor, which changes the vendor
/// scope for the descriptors that follow it in a list.
pub const PRIVATE_DATA_SPECIFIER_TAG: u8 = 0x5F;

/// Extended descriptor identity: a wire tag plus the context that
/// disambiguates it.
///
/// The 8-bit tag space is reused by independent specification bodies,
/// vendor-private extensions, and application-specific tables, so a tag
/// alone never determines a descriptor's shape. Each variant of this enum
/// is one disambiguation level; absent context fields act as wildcards,
/// resolved most-specific-first by the registry (table, then vendor, then
/// standards, then bare tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edid {
    /// Valid only inside one specific table (e.g. tags reused by
    /// application tables such as the AIT).
    TableSpecific { tag: u8, table_id: u8 },
    /// Valid only when the given private-data specifier is in scope.
    Private { tag: u8, pds: u32 },
    /// An extension tag pair; `ext` is the first payload byte.
    Extension { tag: u8, ext: u8 },
    /// Valid when at least one of `standards` is active.
    Standard { tag: u8, standards: Standards },
    /// Unconditional fallback.
    Regular { tag: u8 },
}

impl Edid {
    pub fn tag(&self) -> u8 {
        match *self {
            Edid::TableSpecific { tag, .. }
            | Edid::Private { tag, .. }
            | Edid::Extension { tag, .. }
            | Edid::Standard { tag, .. }
            | Edid::Regular { tag } => tag,
        }
    }

    pub fn is_table_specific(&self) -> bool {
        matches!(self, Edid::TableSpecific { .. })
    }

    pub fn table_id(&self) -> Option<u8> {
        match *self {
            Edid::TableSpecific { table_id, .. } => Some(table_id),
            _ => None,
        }
    }

    /// The `tag_extension` byte, for extension identities.
    pub fn extension(&self) -> Option<u8> {
        match *self {
            Edid::Extension { ext, .. } => Some(ext),
            _ => None,
        }
    }
}

impl fmt::Display for Edid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Edid::TableSpecific { tag, table_id } => {
                write!(f, "tag 0x{tag:02X} in table 0x{table_id:02X}")
            }
            Edid::Private { tag, pds } => write!(f, "tag 0x{tag:02X} under PDS 0x{pds:08X}"),
            Edid::Extension { tag, ext } => write!(f, "tag 0x{tag:02X} extension 0x{ext:02X}"),
            Edid::Standard { tag, standards } => write!(f, "tag 0x{tag:02X} ({standards})"),
            Edid::Regular { tag } => write!(f, "tag 0x{tag:02X}"),
        }
    }
}

/// What surrounds a descriptor at the point its tag is resolved: the id of
/// the containing table (if any) and the private-data specifier in scope
/// (if any). The active standards come from the execution context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeContext {
    pub table_id: Option<u8>,
    pub pds: Option<u32>,
}

impl DecodeContext {
    pub fn new() -> Self {
        DecodeContext::default()
    }

    pub fn in_table(table_id: u8) -> Self {
        DecodeContext {
            table_id: Some(table_id),
            pds: None,
        }
    }

    pub fn with_pds(mut self, pds: u32) -> Self {
        self.pds = Some(pds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identity_requires_every_present_field_to_match() {
        assert_eq!(
            Edid::Private { tag: 0x83, pds: 0x28 },
            Edid::Private { tag: 0x83, pds: 0x28 }
        );
        assert_ne!(
            Edid::Private { tag: 0x83, pds: 0x28 },
            Edid::Private { tag: 0x83, pds: 0x3200 }
        );
        assert_ne!(
            Edid::Regular { tag: 0x83 },
            Edid::Private { tag: 0x83, pds: 0x28 }
        );
    }

    #[test]
    fn display_names_the_disambiguating_context() {
        let edid = Edid::TableSpecific { tag: 0x01, table_id: 0x74 };
        assert_eq!(edid.to_string(), "tag 0x01 in table 0x74");
    }
}
