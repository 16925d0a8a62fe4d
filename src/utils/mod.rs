mod hex;

pub use self::hex::{parse_hex, to_hex};
