//! Decoding URL-safe base64 copied from web pages into binary files.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::path::Path;
use tracing::info;

/// Decodes unpadded URL-safe base64, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns the decoder error for invalid input.
pub fn decode_web_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(text.trim())
}

/// Decodes the base64 text in `input` and writes the bytes to `output`.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`Error::Base64Decode`] for invalid content, or an I/O error.
pub fn web2bin(input: &Path, output: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(input).map_err(Error::io("failed to read", input))?;
    let bytes = decode_web_base64(&text).map_err(|source| Error::Base64Decode {
        path: input.to_path_buf(),
        source,
    })?;
    std::fs::write(output, &bytes).map_err(Error::io("failed to write", output))?;

    info!(input = %input.display(), output = %output.display(), bytes = bytes.len(), "Decoded");
    Ok(bytes.len())
}
