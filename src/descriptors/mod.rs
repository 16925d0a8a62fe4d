//! Concrete descriptor variants.
//!
//! Each module defines one wire format, its XML form and its registry
//! entry; [`register_all`] performs the one-time start-up registration.
//! The set deliberately spans every identity level (standard-qualified,
//! extension pair, vendor-private, table-specific) and every duplication
//! policy.

mod application_name;
mod component;
mod iso_639_language;
mod logical_channel_number;
mod network_name;
mod private_data_specifier;
mod service;
mod stream_identifier;
mod supplementary_audio;

pub use self::application_name::{AIT_TABLE_ID, ApplicationName, ApplicationNameDescriptor};
pub use self::component::ComponentDescriptor;
pub use self::iso_639_language::{Iso639LanguageDescriptor, LanguageEntry};
pub use self::logical_channel_number::{EACEM_PDS, LcnEntry, LogicalChannelNumberDescriptor};
pub use self::network_name::NetworkNameDescriptor;
pub use self::private_data_specifier::PrivateDataSpecifierDescriptor;
pub use self::service::ServiceDescriptor;
pub use self::stream_identifier::StreamIdentifierDescriptor;
pub use self::supplementary_audio::SupplementaryAudioDescriptor;

use crate::err::RegistryError;
use crate::registry::Registry;

/// Registers every built-in descriptor type.
///
/// Called once while populating [`Registry::global`]; embedders with their
/// own registry call it during their single-threaded start-up, before any
/// lookup.
pub fn register_all(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(application_name::registration())?;
    registry.register(component::registration())?;
    registry.register(iso_639_language::registration())?;
    registry.register(logical_channel_number::registration())?;
    registry.register(network_name::registration())?;
    registry.register(private_data_specifier::registration())?;
    registry.register(service::registration())?;
    registry.register(stream_identifier::registration())?;
    registry.register(supplementary_audio::registration())?;
    Ok(())
}
