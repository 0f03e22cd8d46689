//! The two compression conventions found in compressed-form files (`.pck`, `.pbd`, `.pbb`).
//!
//! Standard payloads are plain gzip streams. Older tools wrote a wrapped form
//! instead: the first byte XORed with [`LEGACY_MAGIC_KEY`] yields a magic value,
//! and every following byte is XORed with that magic before the result is
//! gzip-decoded.
//!
//! [`decompress`] tries the standard form first and only falls back to the
//! legacy wrapper when gzip decoding reports an error.

use crate::error::{CatalogError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Key applied to the first byte of a legacy payload to recover its magic.
pub const LEGACY_MAGIC_KEY: u8 = 0xC8;

/// Decompress a compressed-form payload, falling back to the legacy wrapper.
///
/// A zero-length payload decodes to zero bytes; placeholder files are empty on
/// disk rather than compressed empty streams.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let primary = match gunzip(bytes) {
        Ok(out) => return Ok(out),
        Err(e) => e,
    };

    tracing::debug!("Standard decompression failed ({}), trying legacy wrapper", primary);

    decompress_legacy(bytes).map_err(|fallback| CatalogError::Decompression {
        primary: primary.to_string(),
        fallback,
    })
}

/// Gzip-compress a payload in the standard convention.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Gzip-compress a payload and wrap it in the legacy convention with `magic`.
pub fn compress_legacy(bytes: &[u8], magic: u8) -> Result<Vec<u8>> {
    let gz = compress(bytes)?;
    let mut out = Vec::with_capacity(gz.len() + 1);
    out.push(magic ^ LEGACY_MAGIC_KEY);
    out.extend(gz.iter().map(|b| b ^ magic));
    Ok(out)
}

fn decompress_legacy(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let (&first, rest) = bytes
        .split_first()
        .ok_or_else(|| "payload is empty".to_string())?;
    let magic = first ^ LEGACY_MAGIC_KEY;
    let unwrapped: Vec<u8> = rest.iter().map(|b| b ^ magic).collect();
    gunzip(&unwrapped).map_err(|e| e.to_string())
}

fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}
