use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::charset::Charset;
use crate::lang::LanguageCode;

/// A fixed-extent byte buffer with independent bit-granular read and write
/// cursors, used for every descriptor payload codec.
///
/// The overflow contract is the whole point of this type: accessors never
/// panic and never return errors. A read past the readable extent yields a
/// zero/empty value, a write past the fixed extent is a no-op, and either
/// sets a sticky error flag queryable through [`ok`](Self::ok). Decoders of
/// untrusted payloads run to completion unconditionally and check the flag
/// once at the end; one field overflowing cannot corrupt sibling fields
/// that were already consumed.
///
/// Variable-cardinality repeated sub-fields are decoded with
/// `while buf.can_read() { .. }`, which terminates on both exhaustion and
/// error.
///
/// Bit fields are most-significant-bit first and may straddle byte
/// boundaries. Byte-aligned multi-byte integers honor the buffer's
/// endianness, big-endian (network order) unless switched.
pub struct PsiBuffer {
    data: Vec<u8>,
    big_endian: bool,
    /// Read cursor, in bits. Never exceeds `wr`.
    rd: usize,
    /// Write cursor, in bits; also the readable extent.
    wr: usize,
    read_error: bool,
    write_error: bool,
}

impl PsiBuffer {
    /// A read-mode buffer over a copy of `payload`; the readable extent is
    /// the whole payload.
    pub fn for_read(payload: &[u8]) -> Self {
        PsiBuffer {
            data: payload.to_vec(),
            big_endian: true,
            rd: 0,
            wr: payload.len() * 8,
            read_error: false,
            write_error: false,
        }
    }

    /// A write-mode buffer of `capacity` bytes; reads observe only what has
    /// been written so far.
    pub fn for_write(capacity: usize) -> Self {
        PsiBuffer {
            data: vec![0; capacity],
            big_endian: true,
            rd: 0,
            wr: 0,
            read_error: false,
            write_error: false,
        }
    }

    pub fn set_little_endian(&mut self) {
        self.big_endian = false;
    }

    pub fn set_big_endian(&mut self) {
        self.big_endian = true;
    }

    /// False once any read or write has overflowed.
    pub fn ok(&self) -> bool {
        !self.read_error && !self.write_error
    }

    pub fn read_error(&self) -> bool {
        self.read_error
    }

    pub fn write_error(&self) -> bool {
        self.write_error
    }

    pub fn remaining_read_bits(&self) -> usize {
        self.wr - self.rd
    }

    pub fn remaining_read_bytes(&self) -> usize {
        self.remaining_read_bits() / 8
    }

    /// Loop condition for repeated sub-fields.
    pub fn can_read(&self) -> bool {
        self.ok() && self.rd < self.wr
    }

    pub fn can_read_bytes(&self, count: usize) -> bool {
        self.ok() && self.rd + count * 8 <= self.wr
    }

    pub fn can_write_bytes(&self, count: usize) -> bool {
        self.ok() && self.wr + count * 8 <= self.data.len() * 8
    }

    /// Bytes written so far (write mode); the trailing partial byte, if
    /// any, is not included.
    pub fn written(&self) -> &[u8] {
        &self.data[..self.wr / 8]
    }

    pub fn write_is_byte_aligned(&self) -> bool {
        self.wr % 8 == 0
    }

    /// An unsigned bit field of 1 to 64 bits, MSB first, possibly
    /// straddling byte boundaries. Returns 0 on overflow.
    pub fn get_bits(&mut self, bits: usize) -> u64 {
        if bits == 0 {
            return 0;
        }
        if !self.ok() || bits > 64 || self.rd + bits > self.wr {
            self.read_error = true;
            return 0;
        }
        let mut value = 0u64;
        for i in 0..bits {
            let pos = self.rd + i;
            let bit = (self.data[pos / 8] >> (7 - pos % 8)) & 1;
            value = (value << 1) | u64::from(bit);
        }
        self.rd += bits;
        value
    }

    /// Same as [`get_bits`](Self::get_bits) with sign extension.
    pub fn get_bits_signed(&mut self, bits: usize) -> i64 {
        let value = self.get_bits(bits);
        if bits == 0 || bits >= 64 || value >> (bits - 1) == 0 {
            value as i64
        } else {
            (value | !((1u64 << bits) - 1)) as i64
        }
    }

    /// Writes the low `bits` bits of `value`, MSB first. No-op on overflow.
    pub fn put_bits(&mut self, value: u64, bits: usize) {
        if bits == 0 {
            return;
        }
        if !self.ok() || bits > 64 || self.wr + bits > self.data.len() * 8 {
            self.write_error = true;
            return;
        }
        for i in 0..bits {
            let bit = (value >> (bits - 1 - i)) & 1;
            let pos = self.wr + i;
            let mask = 1u8 << (7 - pos % 8);
            if bit == 1 {
                self.data[pos / 8] |= mask;
            } else {
                self.data[pos / 8] &= !mask;
            }
        }
        self.wr += bits;
    }

    pub fn put_bits_signed(&mut self, value: i64, bits: usize) {
        self.put_bits(value as u64, bits);
    }

    /// Advances the read cursor without producing a value.
    pub fn skip_bits(&mut self, bits: usize) {
        if !self.ok() {
            return;
        }
        if self.rd + bits > self.wr {
            self.read_error = true;
            return;
        }
        self.rd += bits;
    }

    pub fn skip_bytes(&mut self, count: usize) {
        self.skip_bits(count * 8);
    }

    // Byte-aligned access. A misaligned cursor is an overflow like any
    // other: sticky flag, zero value.
    fn read_aligned(&mut self, count: usize) -> Option<&[u8]> {
        if !self.ok() {
            return None;
        }
        if self.rd % 8 != 0 || self.rd + count * 8 > self.wr {
            self.read_error = true;
            return None;
        }
        let start = self.rd / 8;
        self.rd += count * 8;
        Some(&self.data[start..start + count])
    }

    fn write_aligned(&mut self, count: usize) -> Option<&mut [u8]> {
        if !self.ok() {
            return None;
        }
        if self.wr % 8 != 0 || self.wr + count * 8 > self.data.len() * 8 {
            self.write_error = true;
            return None;
        }
        let start = self.wr / 8;
        self.wr += count * 8;
        Some(&mut self.data[start..start + count])
    }

    pub fn get_u8(&mut self) -> u8 {
        self.read_aligned(1).map_or(0, |b| b[0])
    }

    pub fn get_u16(&mut self) -> u16 {
        let big_endian = self.big_endian;
        self.read_aligned(2).map_or(0, |b| {
            if big_endian {
                BigEndian::read_u16(b)
            } else {
                LittleEndian::read_u16(b)
            }
        })
    }

    pub fn get_u24(&mut self) -> u32 {
        let big_endian = self.big_endian;
        self.read_aligned(3).map_or(0, |b| {
            if big_endian {
                BigEndian::read_u24(b)
            } else {
                LittleEndian::read_u24(b)
            }
        })
    }

    pub fn get_u32(&mut self) -> u32 {
        let big_endian = self.big_endian;
        self.read_aligned(4).map_or(0, |b| {
            if big_endian {
                BigEndian::read_u32(b)
            } else {
                LittleEndian::read_u32(b)
            }
        })
    }

    pub fn get_u48(&mut self) -> u64 {
        let big_endian = self.big_endian;
        self.read_aligned(6).map_or(0, |b| {
            if big_endian {
                BigEndian::read_uint(b, 6)
            } else {
                LittleEndian::read_uint(b, 6)
            }
        })
    }

    pub fn get_u64(&mut self) -> u64 {
        let big_endian = self.big_endian;
        self.read_aligned(8).map_or(0, |b| {
            if big_endian {
                BigEndian::read_u64(b)
            } else {
                LittleEndian::read_u64(b)
            }
        })
    }

    pub fn put_u8(&mut self, value: u8) {
        if let Some(b) = self.write_aligned(1) {
            b[0] = value;
        }
    }

    pub fn put_u16(&mut self, value: u16) {
        let big_endian = self.big_endian;
        if let Some(b) = self.write_aligned(2) {
            if big_endian {
                BigEndian::write_u16(b, value);
            } else {
                LittleEndian::write_u16(b, value);
            }
        }
    }

    pub fn put_u24(&mut self, value: u32) {
        let big_endian = self.big_endian;
        if let Some(b) = self.write_aligned(3) {
            if big_endian {
                BigEndian::write_u24(b, value);
            } else {
                LittleEndian::write_u24(b, value);
            }
        }
    }

    pub fn put_u32(&mut self, value: u32) {
        let big_endian = self.big_endian;
        if let Some(b) = self.write_aligned(4) {
            if big_endian {
                BigEndian::write_u32(b, value);
            } else {
                LittleEndian::write_u32(b, value);
            }
        }
    }

    pub fn put_u48(&mut self, value: u64) {
        let big_endian = self.big_endian;
        if let Some(b) = self.write_aligned(6) {
            if big_endian {
                BigEndian::write_uint(b, value, 6);
            } else {
                LittleEndian::write_uint(b, value, 6);
            }
        }
    }

    pub fn put_u64(&mut self, value: u64) {
        let big_endian = self.big_endian;
        if let Some(b) = self.write_aligned(8) {
            if big_endian {
                BigEndian::write_u64(b, value);
            } else {
                LittleEndian::write_u64(b, value);
            }
        }
    }

    /// A fixed 3-character language code. Returns the default ("und") on
    /// overflow.
    pub fn get_language_code(&mut self) -> LanguageCode {
        self.read_aligned(3)
            .map_or_else(LanguageCode::default, |b| {
                LanguageCode::from_bytes([b[0], b[1], b[2]])
            })
    }

    pub fn put_language_code(&mut self, code: LanguageCode) {
        let bytes = *code.as_bytes();
        if let Some(b) = self.write_aligned(3) {
            b.copy_from_slice(&bytes);
        }
    }

    /// A raw byte range. Returns an empty vector on overflow.
    pub fn get_bytes(&mut self, count: usize) -> Vec<u8> {
        self.read_aligned(count).map_or_else(Vec::new, <[u8]>::to_vec)
    }

    /// Every remaining readable byte.
    pub fn remaining_bytes(&mut self) -> Vec<u8> {
        let count = self.remaining_read_bytes();
        self.get_bytes(count)
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        if let Some(b) = self.write_aligned(bytes.len()) {
            b.copy_from_slice(bytes);
        }
    }

    /// Decodes every remaining byte as one string in `charset`.
    pub fn get_string(&mut self, charset: Charset) -> String {
        let bytes = self.remaining_bytes();
        charset.decode(&bytes)
    }

    /// A string with a one-byte length prefix, decoded via `charset`.
    /// Returns an empty string on overflow.
    pub fn get_string_with_byte_length(&mut self, charset: Charset) -> String {
        let length = self.get_u8() as usize;
        let bytes = self.get_bytes(length);
        if !self.ok() {
            return String::new();
        }
        charset.decode(&bytes)
    }

    /// Writes every encoded byte of `text`, unprefixed.
    pub fn put_string(&mut self, text: &str, charset: Charset) {
        let bytes = charset.encode(text);
        self.put_bytes(&bytes);
    }

    /// Writes `text` behind a one-byte length prefix. An encoding longer
    /// than 255 bytes cannot be represented and is an overflow.
    pub fn put_string_with_byte_length(&mut self, text: &str, charset: Charset) {
        let bytes = charset.encode(text);
        if bytes.len() > 0xFF {
            self.write_error = true;
            return;
        }
        self.put_u8(bytes.len() as u8);
        self.put_bytes(&bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bit_fields_straddle_byte_boundaries() {
        let mut w = PsiBuffer::for_write(4);
        w.put_bits(0b101, 3);
        w.put_bits(0x1FF, 10); // crosses into the third byte
        w.put_bits(0b011, 3);
        assert!(w.ok());
        assert_eq!(w.written(), &[0b1011_1111, 0b1111_1011]);

        let mut r = PsiBuffer::for_read(&[0b1011_1111, 0b1111_1011]);
        assert_eq!(r.get_bits(3), 0b101);
        assert_eq!(r.get_bits(10), 0x1FF);
        assert_eq!(r.get_bits(3), 0b011);
        assert!(r.ok());
        assert!(!r.can_read());
    }

    #[test]
    fn signed_bit_fields_sign_extend() {
        let mut w = PsiBuffer::for_write(2);
        w.put_bits_signed(-3, 5);
        w.put_bits_signed(7, 5);
        let mut r = PsiBuffer::for_read(w.written());
        assert_eq!(r.get_bits_signed(5), -3);
        assert_eq!(r.get_bits_signed(5), 7);
    }

    #[test]
    fn read_overflow_is_sticky_and_returns_zero() {
        let mut r = PsiBuffer::for_read(&[0xAB]);
        assert_eq!(r.get_u8(), 0xAB);
        assert_eq!(r.get_u16(), 0); // overflow
        assert!(!r.ok());
        assert!(r.read_error());
        // Subsequent reads stay dead even though a byte-sized read would
        // otherwise fit.
        assert_eq!(r.get_u8(), 0);
        assert!(!r.can_read());
    }

    #[test]
    fn write_overflow_is_a_no_op() {
        let mut w = PsiBuffer::for_write(2);
        w.put_u16(0x1234);
        w.put_u8(0x56); // overflow
        assert!(w.write_error());
        assert_eq!(w.written(), &[0x12, 0x34]);
    }

    #[test]
    fn one_field_overflow_keeps_earlier_fields_intact() {
        let mut r = PsiBuffer::for_read(&[0x01, 0x02]);
        let first = r.get_u8();
        let second = r.get_u32(); // overflow
        assert_eq!((first, second), (0x01, 0));
        assert!(!r.ok());
    }

    #[test]
    fn byte_aligned_integers_honor_endianness() {
        let mut r = PsiBuffer::for_read(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(r.get_u16(), 0x1234);
        r.set_little_endian();
        assert_eq!(r.get_u16(), 0x7856);

        let mut w = PsiBuffer::for_write(7);
        w.put_u24(0xABCDEF);
        w.set_little_endian();
        w.put_u32(0x0102_0304);
        assert_eq!(w.written(), &[0xAB, 0xCD, 0xEF, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn misaligned_multibyte_access_is_an_error() {
        let mut r = PsiBuffer::for_read(&[0xFF, 0x00]);
        r.get_bits(4);
        assert_eq!(r.get_u8(), 0);
        assert!(!r.ok());
    }

    #[test]
    fn language_codes_round_trip() {
        let mut w = PsiBuffer::for_write(3);
        w.put_language_code("eng".parse().unwrap());
        let mut r = PsiBuffer::for_read(w.written());
        assert_eq!(r.get_language_code().as_str(), "eng");
    }

    #[test]
    fn length_prefixed_strings_round_trip() {
        let mut w = PsiBuffer::for_write(32);
        w.put_string_with_byte_length("Mux Operator", Charset::Dvb);
        w.put_u8(0x7E);
        let mut r = PsiBuffer::for_read(w.written());
        assert_eq!(r.get_string_with_byte_length(Charset::Dvb), "Mux Operator");
        assert_eq!(r.get_u8(), 0x7E);
        assert!(r.ok());
    }

    #[test]
    fn truncated_length_prefixed_string_is_empty_and_flagged() {
        // Length prefix promises 5 bytes, only 2 are present.
        let mut r = PsiBuffer::for_read(&[0x05, b'a', b'b']);
        assert_eq!(r.get_string_with_byte_length(Charset::Dvb), "");
        assert!(!r.ok());
    }

    #[test]
    fn can_read_drives_repeated_field_loops() {
        let mut r = PsiBuffer::for_read(&[1, 2, 3, 4, 5, 6]);
        let mut pairs = Vec::new();
        while r.can_read_bytes(2) {
            pairs.push((r.get_u8(), r.get_u8()));
        }
        assert_eq!(pairs, vec![(1, 2), (3, 4), (5, 6)]);
        assert!(r.ok());
    }

    #[test]
    fn write_mode_reads_observe_only_written_extent() {
        let mut b = PsiBuffer::for_write(8);
        b.put_u16(0xBEEF);
        assert_eq!(b.remaining_read_bytes(), 2);
        assert_eq!(b.get_u16(), 0xBEEF);
        assert!(!b.can_read());
    }
}
