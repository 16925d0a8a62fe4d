//! `sidesc` is a codec and type-registry framework for the PSI/SI
//! descriptors carried in DVB/MPEG transport streams.
//!
//! A descriptor travels as a tag-length-value binary record whose 8-bit
//! tag is reused by independent specification bodies, vendor-private
//! extensions and application tables. This crate converts between that
//! wire form, strongly-typed in-memory structs, and an XML editing form,
//! resolving each tag through an extended identity ([`Edid`]) looked up in
//! a process-wide [`Registry`].
//!
//! All binary decoding is tolerant by construction: payload codecs run
//! over a sticky-error [`PsiBuffer`] that never panics, and a malformed
//! payload yields an instance in the `Invalid` state instead of an error.
//! Unknown tags decode to a hex-preserving [`OpaqueDescriptor`] so that
//! editing round-trips are lossless.
//!
//! ```
//! use sidesc::descriptors::{Iso639LanguageDescriptor, LanguageEntry};
//! use sidesc::{Context, DescriptorList};
//!
//! let ctx = Context::default();
//! let mut list = DescriptorList::new();
//! list.add(
//!     &ctx,
//!     &Iso639LanguageDescriptor::new(vec![LanguageEntry {
//!         language: "fre".parse().unwrap(),
//!         audio_type: 0,
//!     }]),
//! );
//! assert_eq!(list.search_language(&ctx, "FRE"), Some(0));
//! ```

pub mod buffer;
pub mod charset;
pub mod context;
pub mod descriptor;
pub mod descriptor_list;
pub mod descriptors;
pub mod edid;
pub mod err;
pub mod lang;
pub mod registry;
pub mod standards;
pub mod traits;
pub mod utils;
pub mod xml;

pub use crate::buffer::PsiBuffer;
pub use crate::charset::Charset;
pub use crate::context::Context;
pub use crate::descriptor::{Descriptor, MAX_DESCRIPTOR_PAYLOAD, OpaqueDescriptor};
pub use crate::descriptor_list::DescriptorList;
pub use crate::edid::{DecodeContext, Edid};
pub use crate::err::{RegistryError, XmlError};
pub use crate::lang::LanguageCode;
pub use crate::registry::{Registration, Registry, StandardsAmbiguity};
pub use crate::standards::Standards;
pub use crate::traits::{DecodeState, DuplicationMode, TypedDescriptor};
