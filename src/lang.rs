use std::fmt;
use std::str::FromStr;

/// A 3-character ISO 639-2 language code as carried on the wire.
///
/// The wire form is three bytes, nominally lowercase ASCII letters, but
/// externally supplied sections cannot be trusted to respect that. The raw
/// bytes are kept as-is; comparison against user-supplied codes is
/// case-insensitive, which is how all language searches behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageCode([u8; 3]);

impl LanguageCode {
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        LanguageCode(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    /// Lossy text form; non-ASCII wire bytes render as '?'.
    pub fn as_str(&self) -> String {
        self.0
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '?' })
            .collect()
    }

    pub fn matches_ignore_case(&self, code: &str) -> bool {
        let code = code.as_bytes();
        code.len() == 3
            && self
                .0
                .iter()
                .zip(code)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        LanguageCode(*b"und")
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii) {
            return Err(());
        }
        Ok(LanguageCode([bytes[0], bytes[1], bytes[2]]))
    }
}
