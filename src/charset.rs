use encoding::all::ISO_8859_1;
use encoding::{DecoderTrap, EncoderTrap, Encoding};

/// Selector byte that switches a DVB string to UTF-8 (EN 300 468 annex A).
const DVB_UTF8_SELECTOR: u8 = 0x15;

/// Character sets understood by the string accessors.
///
/// `Dvb` is the broadcast default: a Latin table unless the string opens
/// with the 0x15 selector byte, in which case the remainder is UTF-8. The
/// default Latin table (ISO 6937) is handled as ISO 8859-1 here, which is
/// exact for the character repertoire used in practice.
///
/// Both directions are infallible: undecodable bytes are replaced, and
/// encoding falls back to the UTF-8 selector form when the text does not
/// fit the Latin table. Callers never observe an error from this facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Dvb,
    Utf8,
}

impl Charset {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Dvb => match bytes.split_first() {
                Some((&DVB_UTF8_SELECTOR, rest)) => String::from_utf8_lossy(rest).into_owned(),
                _ => ISO_8859_1
                    .decode(bytes, DecoderTrap::Replace)
                    .unwrap_or_default(),
            },
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Dvb => match ISO_8859_1.encode(text, EncoderTrap::Strict) {
                Ok(bytes) => bytes,
                Err(_) => {
                    // Not Latin-representable: use the UTF-8 selector form.
                    let mut bytes = Vec::with_capacity(1 + text.len());
                    bytes.push(DVB_UTF8_SELECTOR);
                    bytes.extend_from_slice(text.as_bytes());
                    bytes
                }
            },
        }
    }
}
