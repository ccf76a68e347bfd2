//! Base64 helpers for document content.
//!
//! Document bytes travel to and from the API as standard-alphabet base64.
//! Decoding is lenient about whitespace and padding since inline content is
//! often pasted by hand or wrapped by the producer.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encode bytes as standard padded base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64, ignoring ASCII whitespace and missing padding.
pub fn decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    LENIENT.decode(compact.as_bytes())
}

/// Strip a `data:<mime>;base64,` prefix from inline content.
///
/// Anything up to and including the first comma is dropped, so a bare
/// base64 string passes through unchanged.
pub fn strip_data_url(input: &str) -> &str {
    match input.split_once(',') {
        Some((_, rest)) => rest,
        None => input,
    }
}

/// First `max` characters of `input`, with an ellipsis when truncated.
pub fn preview(input: &str, max: usize) -> String {
    let mut chars = input.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
