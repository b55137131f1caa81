//! The service's base64 dialect.
//!
//! Encoding is url-safe without padding. Decoding is more forgiving than
//! standard base64url: it accepts both alphabets, drops stray `,`
//! separators, re-derives padding from the length and tolerates non-zero
//! trailing bits (the service emits them in link keys).

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{MegashareError, Result};

/// Standard alphabet, canonical padding, lenient trailing bits.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Encode bytes as url-safe base64 with no `=` padding.
pub fn encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode the service's base64 dialect.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let mut normalized: String = input
        .chars()
        .filter(|c| *c != ',')
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    match normalized.len() % 4 {
        2 => normalized.push_str("=="),
        3 => normalized.push('='),
        _ => {}
    }

    LENIENT_STANDARD
        .decode(normalized.as_bytes())
        .map_err(|err| MegashareError::format(format!("invalid base64: {err}")))
}
