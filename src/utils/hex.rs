use std::fmt::Write;

/// Uppercase, unseparated hex rendering of a byte slice.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{b:02X}");
    }
    out
}

/// Parses hex text into bytes. Whitespace between digit pairs is
/// tolerated; an odd digit count or a non-hex character is `None`.
pub fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    if digits.len() % 2 != 0 {
        return None;
    }
    Some(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip() {
        let bytes = vec![0x00, 0x7F, 0xAB, 0xFF];
        assert_eq!(parse_hex(&to_hex(&bytes)), Some(bytes));
    }

    #[test]
    fn tolerates_whitespace_and_case() {
        assert_eq!(parse_hex("ab CD\n01"), Some(vec![0xAB, 0xCD, 0x01]));
    }

    #[test]
    fn rejects_odd_or_non_hex_input() {
        assert_eq!(parse_hex("ABC"), None);
        assert_eq!(parse_hex("zz"), None);
    }
}
