/// Hexadecimal payload expansion into fixed-width bitfields.
use std::fmt;

use crate::{Error, TIResult};

/// A tracker payload expanded from hex digits into a left-zero-padded
/// sequence of binary digits.
///
/// The width is `max(min_width, raw_width)` where `raw_width` is the number
/// of binary digits of the encoded integer with leading zeros stripped (the
/// wire format carries no explicit frame type, so `raw_width` is what the
/// router dispatches on). Padding only ever adds zeros on the left; no
/// significant bit is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    bytes: Vec<u8>,
    width: usize,
    raw_width: usize,
}

impl BitString {
    /// Expand `hex` into a bit string of at least `min_width` binary digits.
    ///
    /// Fails with [`Error::MalformedPayload`] if `hex` is empty or contains a
    /// character outside base 16 (no sign, no `0x` prefix).
    pub fn from_hex(hex: &str, min_width: usize) -> TIResult<Self> {
        if hex.is_empty() {
            return Err(Error::MalformedPayload("empty hex payload".to_string()));
        }
        let mut nibbles = Vec::with_capacity(hex.len());
        for c in hex.chars() {
            let n = c
                .to_digit(16)
                .ok_or_else(|| Error::MalformedPayload(format!("invalid hex digit {c:?}")))?;
            nibbles.push(n as u8);
        }

        // Leading zero hex digits carry no value and do not count toward the
        // significant width; an all-zero payload still has width 1.
        let lead = nibbles.iter().take_while(|&&n| n == 0).count();
        let raw_width = if lead == nibbles.len() {
            1
        } else {
            let first = nibbles[lead];
            (nibbles.len() - lead - 1) * 4 + (8 - first.leading_zeros() as usize)
        };

        let width = raw_width.max(min_width);
        let n_bytes = width.div_ceil(8);
        let mut bytes = vec![0u8; n_bytes];
        for (i, &n) in nibbles[lead..].iter().rev().enumerate() {
            bytes[n_bytes - 1 - i / 2] |= n << ((i % 2) * 4);
        }

        Ok(Self {
            bytes,
            width,
            raw_width,
        })
    }

    /// Padded width in binary digits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Significant width of the encoded integer, leading zeros stripped.
    pub fn raw_width(&self) -> usize {
        self.raw_width
    }

    /// The value right-aligned in `ceil(width / 8)` big-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.bytes.len() * 8;
        for pos in (total - self.width)..total {
            let bit = (self.bytes[pos / 8] >> (7 - pos % 8)) & 1;
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lazy_init_tracing;

    #[test]
    fn test_hex_round_trip() {
        lazy_init_tracing();
        for hex in ["cfd2", "8fda", "1", "ff", "2b82ee3901793f7100df21"] {
            let bits = BitString::from_hex(hex, 16).unwrap();
            let value = u128::from_str_radix(&bits.to_string(), 2).unwrap();
            assert_eq!(value, u128::from_str_radix(hex, 16).unwrap(), "hex {hex}");
        }
    }

    #[test]
    fn test_left_pad_to_min_width() {
        lazy_init_tracing();
        let bits = BitString::from_hex("1", 16).unwrap();
        assert_eq!(bits.width(), 16);
        assert_eq!(bits.raw_width(), 1);
        assert_eq!(bits.to_string(), "0000000000000001");
    }

    #[test]
    fn test_leading_zero_digits_do_not_count() {
        lazy_init_tracing();
        // 0x0fda has 12 significant bits even though it spans 16 on the wire.
        let bits = BitString::from_hex("0fda", 16).unwrap();
        assert_eq!(bits.raw_width(), 12);
        assert_eq!(bits.width(), 16);
        assert_eq!(bits.to_string(), "0000111111011010");

        let zero = BitString::from_hex("00", 16).unwrap();
        assert_eq!(zero.raw_width(), 1);
    }

    #[test]
    fn test_wider_than_min_width() {
        lazy_init_tracing();
        let bits = BitString::from_hex("2b82ee3901793f7100df21", 16).unwrap();
        assert_eq!(bits.raw_width(), 86);
        assert_eq!(bits.width(), 86);
        let padded = BitString::from_hex("2b82ee3901793f7100df21", 88).unwrap();
        assert_eq!(padded.width(), 88);
        assert!(padded.to_string().starts_with("00101011"));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        lazy_init_tracing();
        for bad in ["", "xyz", "cf d2", "0x12"] {
            let res = BitString::from_hex(bad, 16);
            assert!(
                matches!(res, Err(Error::MalformedPayload(_))),
                "input {bad:?}"
            );
        }
    }
}
