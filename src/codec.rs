//! Binary↔text codecs shared across the protocol.
//!
//! Envelope fields and fingerprints travel as text: standard base64 (padded,
//! not URL-safe) for binary members, lowercase hex for digests. Both must
//! round-trip exactly for any byte sequence, including empty input.

use base64::engine::general_purpose::STANDARD;
use base64::{DecodeError, Engine as _};

/// Encode bytes as standard base64 (with padding).
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 back into bytes.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(text)
}

/// Lowercase hex, two digits per byte, no separators.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn base64_empty_roundtrip() {
        assert_eq!(encode_base64(b""), "");
        assert_eq!(decode_base64("").unwrap(), b"");
    }

    #[test]
    fn base64_known_value() {
        // "Man" is the canonical RFC 4648 example
        assert_eq!(encode_base64(b"Man"), "TWFu");
        assert_eq!(encode_base64(b"Ma"), "TWE=");
    }

    #[test]
    fn base64_rejects_urlsafe_alphabet() {
        // '-' and '_' belong to the URL-safe variant only
        assert!(decode_base64("a-b_").is_err());
    }

    #[test]
    fn hex_lowercase_two_digits() {
        assert_eq!(to_hex(&[0x00, 0x0f, 0xab, 0xff]), "000fabff");
    }

    proptest! {
        #[test]
        fn base64_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = encode_base64(&bytes);
            prop_assert_eq!(decode_base64(&encoded).unwrap(), bytes);
        }
    }
}
