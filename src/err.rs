use thiserror::Error;

use crate::edid::Edid;

/// Schema violations raised while analyzing the XML form of a descriptor.
///
/// These are local to one element: the caller logs them and continues with
/// the element's siblings. Binary malformation is deliberately absent from
/// this taxonomy; a bad payload marks the typed instance `Invalid` and is
/// logged at debug level, it never surfaces as an `Err`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum XmlError {
    #[error("line {line}: <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: String,
        line: usize,
    },

    #[error("line {line}: <{element}> attribute '{attribute}' has invalid value '{value}'")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        line: usize,
    },

    #[error(
        "line {line}: <{element}> attribute '{attribute}' value {value} is out of range {min}..={max}"
    )]
    OutOfRange {
        element: String,
        attribute: String,
        value: u64,
        min: u64,
        max: u64,
        line: usize,
    },

    #[error("line {line}: <{element}> has malformed hex content")]
    BadHexContent { element: String, line: usize },

    #[error("line {line}: <{element}> is not a known descriptor element")]
    UnknownElement { element: String, line: usize },

    #[error("line {line}: <{element}> does not serialize to a valid descriptor")]
    InvalidContent { element: String, line: usize },

    #[error("malformed XML document: {message}")]
    Malformed { message: String },
}

impl XmlError {
    pub(crate) fn malformed(message: impl ToString) -> Self {
        XmlError::Malformed {
            message: message.to_string(),
        }
    }
}

/// Registration conflicts detected while populating the type registry.
///
/// These are fatal by design: two factories claiming the same decoding
/// context is a defect in the build, not in any input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a descriptor factory is already registered for {edid}")]
    DuplicateEdid { edid: Edid },

    #[error(
        "standard-qualified registrations for tag 0x{tag:02X} have overlapping standards sets"
    )]
    OverlappingStandards { tag: u8 },

    #[error("the XML name '{name}' is already registered")]
    DuplicateXmlName { name: String },
}
