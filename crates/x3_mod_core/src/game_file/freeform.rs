//! Free-form text files (XML, scripts, non-table text).
//!
//! The encoding is detected once on load, from a byte-order mark or an
//! `encoding="..."` declaration on the first line, and reused on save.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use regex::bytes::Regex;
use std::sync::LazyLock;

static ENCODING_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"encoding\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

/// Text content with the encoding it was read in.
#[derive(Debug, Clone)]
pub struct FreeformText {
    text: String,
    encoding: &'static Encoding,
    bom: bool,
    modified: bool,
}

impl FreeformText {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            return Self {
                text: text.into_owned(),
                encoding,
                bom: true,
                modified: false,
            };
        }

        let encoding = sniff_declaration(bytes).unwrap_or(UTF_8);
        let (text, _) = encoding.decode_without_bom_handling(bytes);
        Self {
            text: text.into_owned(),
            encoding,
            bom: false,
            modified: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.modified = true;
        }
    }

    /// Name of the detected encoding.
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Encode the text back in its original encoding.
    ///
    /// Returns `None` if the text holds characters the encoding cannot represent.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(self.text.len() + 3);

        // encoding_rs only decodes UTF-16, so it is written by hand.
        if self.encoding == UTF_16LE || self.encoding == UTF_16BE {
            let little = self.encoding == UTF_16LE;
            let units = (self.bom.then_some('\u{feff}').into_iter())
                .chain(self.text.chars())
                .collect::<String>();
            for unit in units.encode_utf16() {
                let pair = if little {
                    unit.to_le_bytes()
                } else {
                    unit.to_be_bytes()
                };
                out.extend_from_slice(&pair);
            }
            return Some(out);
        }

        if self.bom && self.encoding == UTF_8 {
            out.extend_from_slice(b"\xEF\xBB\xBF");
        }
        let (bytes, _, had_errors) = self.encoding.encode(&self.text);
        if had_errors {
            return None;
        }
        out.extend_from_slice(&bytes);
        Some(out)
    }
}

/// Encoding named by an `encoding="..."` declaration on the first line.
fn sniff_declaration(bytes: &[u8]) -> Option<&'static Encoding> {
    let first_line = bytes.split(|b| *b == b'\n').next()?;
    let label = ENCODING_DECL.captures(first_line)?.get(1)?;
    let encoding = Encoding::for_label(label.as_bytes());
    if encoding.is_none() {
        tracing::debug!(
            "Unknown encoding label '{}', falling back to UTF-8",
            String::from_utf8_lossy(label.as_bytes())
        );
    }
    encoding
}
