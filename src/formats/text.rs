//! Byte-to-text decoding with a legacy codepage fallback.

use encoding_rs::{UTF_8, WINDOWS_1254};
use tracing::debug;

/// Which decoder produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Western/Turkish single-byte codepage written by older export tools
    Windows1254,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decode bytes as strict UTF-8, falling back to Windows-1254.
///
/// The fallback is defined for every byte sequence, so this never fails.
/// A leading byte-order mark is kept; the markup normalizer strips it.
pub fn decode(bytes: &[u8]) -> DecodedText {
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return DecodedText {
            text: text.into_owned(),
            encoding: TextEncoding::Utf8,
        };
    }

    debug!("Input is not valid UTF-8, decoding as windows-1254");
    let (text, _) = WINDOWS_1254.decode_without_bom_handling(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: TextEncoding::Windows1254,
    }
}

/// Shorthand for callers that only need the string
pub fn decode_text(bytes: &[u8]) -> String {
    decode(bytes).text
}
