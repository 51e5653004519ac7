//! Text-safe encoding for binary event payloads
//!
//! Binary payloads are stored as standard base64 (`A-Z a-z 0-9 + /`, `=`
//! padding, 3 bytes to 4 symbols) so the persisted document stays plain JSON.
//! Decoding is deliberately forgiving: it never fails, it only returns fewer
//! bytes.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use tracing::trace;

/// Decoder that accepts missing padding and non-zero trailing bits
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode raw bytes to their text form
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a text form back to bytes
///
/// Characters outside the alphabet are stripped first. Each `=`-terminated
/// run is decoded on its own, so concatenated padded chunks still decode.
/// A dangling single symbol carries fewer than 8 bits and is dropped.
pub fn decode(input: &str) -> Vec<u8> {
    let cleaned: String = input.chars().filter(|c| is_alphabet(*c)).collect();

    let mut out = Vec::with_capacity(cleaned.len() / 4 * 3 + 3);
    for segment in cleaned.split('=').filter(|s| !s.is_empty()) {
        let usable = if segment.len() % 4 == 1 {
            &segment[..segment.len() - 1]
        } else {
            segment
        };
        if usable.is_empty() {
            continue;
        }
        match LENIENT.decode(usable) {
            Ok(bytes) => out.extend_from_slice(&bytes),
            Err(e) => trace!(error = %e, "Skipping undecodable payload segment"),
        }
    }
    out
}

fn is_alphabet(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let samples: Vec<Vec<u8>> = vec![
            vec![],
            vec![0],
            vec![0xff, 0x00],
            vec![1, 2, 3],
            (0..=255).collect(),
            b"telemetry payload".to_vec(),
        ];
        for bytes in samples {
            assert_eq!(decode(&encode(&bytes)), bytes);
        }
    }

    #[test]
    fn test_padding() {
        assert_eq!(encode(b"A"), "QQ==");
        assert_eq!(encode(b"AB"), "QUI=");
        assert_eq!(encode(b"ABC"), "QUJD");
    }

    #[test]
    fn test_decode_strips_foreign_characters() {
        assert_eq!(decode("SGVs\nbG8=\r\n"), b"Hello");
        assert_eq!(decode(" S G V s b G 8 = "), b"Hello");
        assert_eq!(decode("SGVs-bG8_="), b"Hello");
    }

    #[test]
    fn test_decode_unpadded() {
        assert_eq!(decode("QQ"), b"A");
        assert_eq!(decode("QUI"), b"AB");
    }

    #[test]
    fn test_decode_malformed_is_best_effort() {
        assert!(decode("").is_empty());
        assert!(decode("@@@@").is_empty());
        assert!(decode("Q").is_empty());
        // trailing dangling symbol is dropped, the rest survives
        assert_eq!(decode("QUJDQ"), b"ABC");
    }

    #[test]
    fn test_decode_concatenated_chunks() {
        assert_eq!(decode("QQ==QQ=="), b"AA");
    }
}
