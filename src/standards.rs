use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Specification bodies whose descriptor tag assignments may overlap.
    ///
    /// Several standards can be simultaneously active in one execution
    /// context; a standard-qualified registration matches when its set
    /// intersects the active set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Standards: u8 {
        const MPEG = 0x01;
        const DVB  = 0x02;
        const SCTE = 0x04;
        const ATSC = 0x08;
        const ISDB = 0x10;
    }
}

impl fmt::Display for Standards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (name, flag) in [
            ("MPEG", Standards::MPEG),
            ("DVB", Standards::DVB),
            ("SCTE", Standards::SCTE),
            ("ATSC", Standards::ATSC),
            ("ISDB", Standards::ISDB),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_joins_active_standards() {
        assert_eq!((Standards::MPEG | Standards::DVB).to_string(), "MPEG+DVB");
        assert_eq!(Standards::empty().to_string(), "none");
    }

    #[test]
    fn intersection_is_the_match_rule() {
        let registered = Standards::ATSC | Standards::SCTE;
        assert!(registered.intersects(Standards::ATSC));
        assert!(!registered.intersects(Standards::DVB | Standards::ISDB));
    }
}
