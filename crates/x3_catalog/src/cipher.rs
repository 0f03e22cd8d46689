//! Byte-level obfuscation used by catalog pairs.
//!
//! Two ciphers are involved:
//!
//! - **Index cipher**: a running XOR. The key starts at [`INDEX_KEY_START`] and
//!   increments by one (wrapping) for every byte consumed. Since XOR is its own
//!   inverse, encoding and decoding are the same transform.
//! - **Entry cipher**: every byte of a data file payload is XORed with the fixed
//!   [`ENTRY_KEY`].
//!
//! Decoded index bytes are converted to text as Windows-1252 so that every byte
//! value maps to exactly one character and back.

use encoding_rs::WINDOWS_1252;

/// Initial key of the running index cipher.
pub const INDEX_KEY_START: u8 = 0xDB;

/// Fixed key of the data file cipher.
pub const ENTRY_KEY: u8 = 0x33;

/// Apply the running index cipher to `bytes` in place.
pub fn apply_index_cipher(bytes: &mut [u8]) {
    let mut key = INDEX_KEY_START;
    for byte in bytes.iter_mut() {
        *byte ^= key;
        key = key.wrapping_add(1);
    }
}

/// Apply the fixed entry cipher to `bytes` in place.
pub fn apply_entry_cipher(bytes: &mut [u8]) {
    for byte in bytes.iter_mut() {
        *byte ^= ENTRY_KEY;
    }
}

/// Decode an index file's raw bytes into its text form.
pub fn decode_index(bytes: &[u8]) -> String {
    let mut plain = bytes.to_vec();
    apply_index_cipher(&mut plain);
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(&plain);
    text.into_owned()
}

/// Encode index text into the on-disk byte form. Inverse of [`decode_index`].
pub fn encode_index(text: &str) -> Vec<u8> {
    let (bytes, _, _) = WINDOWS_1252.encode(text);
    let mut bytes = bytes.into_owned();
    apply_index_cipher(&mut bytes);
    bytes
}

/// Decode one data file payload.
pub fn decode_entry(bytes: &[u8]) -> Vec<u8> {
    let mut plain = bytes.to_vec();
    apply_entry_cipher(&mut plain);
    plain
}

/// Encode one payload for storage in a data file. Inverse of [`decode_entry`].
pub fn encode_entry(bytes: &[u8]) -> Vec<u8> {
    decode_entry(bytes)
}
