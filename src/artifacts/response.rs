//! The resolver's answer to the client
//!
//! `response.txt` is written by the fuzzing harness in one of three shapes:
//! a byte literal holding hex (`b'8183...'`), a byte literal with escaped
//! bytes (`b'\x7e\xb8...'`), or a bare hex dump. A harness timeout is
//! recorded as a sentence mentioning the timeout instead.

use std::path::Path;

use crate::artifacts::{read_trimmed, ArtifactError};
use crate::dns::protocol::HEADER_LEN;

/// Bare hex dumps shorter than a DNS header are not recognized
const MIN_BARE_HEX_DIGITS: usize = 24;

const TIMEOUT_MARKERS: [&str; 3] = ["TIMEOUT", "TIMED OUT", "NO RESPONSE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseArtifact {
    /// No response file, or an empty one
    Absent,
    /// The harness reported that no answer arrived
    Timeout,
    /// A body that could not be turned into at least a header's worth of bytes
    Malformed,
    /// Raw DNS message bytes, at least `HEADER_LEN` long
    Wire(Vec<u8>),
}

impl ResponseArtifact {
    pub fn is_present(&self) -> bool {
        *self != ResponseArtifact::Absent
    }

    /// Interprets the trimmed body of a response file.
    pub fn from_text(text: &str) -> ResponseArtifact {
        let upper = text.to_uppercase();
        if TIMEOUT_MARKERS.iter().any(|m| upper.contains(m)) {
            return ResponseArtifact::Timeout;
        }

        match extract_bytes(text) {
            Ok(raw) if raw.len() >= HEADER_LEN => ResponseArtifact::Wire(raw),
            Ok(raw) => {
                log::debug!("response of {} bytes has no header", raw.len());
                ResponseArtifact::Malformed
            }
            Err(e) => {
                log::debug!("response body rejected: {}", e);
                ResponseArtifact::Malformed
            }
        }
    }
}

/// Loads `response.txt`.
pub fn load(path: &Path) -> ResponseArtifact {
    match read_trimmed(path) {
        Ok(text) => ResponseArtifact::from_text(&text),
        Err(e) => {
            if !e.is_absent() {
                log::warn!("response file {} unreadable: {}", path.display(), e);
            }
            ResponseArtifact::Absent
        }
    }
}

fn encoding(reason: &str) -> ArtifactError {
    ArtifactError::Encoding {
        reason: reason.to_string(),
    }
}

fn decode_hex(text: &str) -> Result<Vec<u8>, ArtifactError> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&clean).map_err(|e| ArtifactError::Encoding {
        reason: e.to_string(),
    })
}

/// Tries every known encoding of a response body.
pub fn extract_bytes(text: &str) -> Result<Vec<u8>, ArtifactError> {
    for quote in ['\'', '"'].iter() {
        if let Some(inner) = literal_body(text, *quote) {
            if let Ok(raw) = decode_hex(inner) {
                return Ok(raw);
            }
            if let Ok(raw) = unescape_byte_literal(inner, *quote) {
                return Ok(raw);
            }
        }
    }

    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if clean.len() >= MIN_BARE_HEX_DIGITS && clean.chars().all(|c| c.is_ascii_hexdigit()) {
        return decode_hex(&clean);
    }

    Err(encoding("neither a byte literal nor a hex dump"))
}

/// The text between `b<quote>` and the closing `<quote>`
fn literal_body(text: &str, quote: char) -> Option<&str> {
    let rest = text.strip_prefix('b')?.strip_prefix(quote)?;
    rest.strip_suffix(quote)
}

/// Decodes the body of a byte literal with the usual escapes: `\\`, quotes,
/// `\a \b \f \n \r \t \v`, `\xHH`, one to three octal digits and escaped
/// newlines. Unknown escapes keep their backslash.
pub fn unescape_byte_literal(body: &str, quote: char) -> Result<Vec<u8>, ArtifactError> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii() {
            return Err(encoding("non-ASCII character in byte literal"));
        }
        if b == quote as u8 {
            return Err(encoding("unescaped quote in byte literal"));
        }
        if b == b'\n' || b == b'\r' {
            return Err(encoding("line break in byte literal"));
        }
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let esc = match bytes.get(i + 1) {
            Some(esc) => *esc,
            None => return Err(encoding("dangling backslash")),
        };
        i += 2;

        match esc {
            b'\n' => {}
            b'\\' => out.push(b'\\'),
            b'\'' => out.push(b'\''),
            b'"' => out.push(b'"'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'x' => {
                let digits = bytes
                    .get(i..i + 2)
                    .ok_or_else(|| encoding("truncated \\x escape"))?;
                let value = std::str::from_utf8(digits)
                    .ok()
                    .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
                    .and_then(|d| u8::from_str_radix(d, 16).ok())
                    .ok_or_else(|| encoding("invalid \\x escape"))?;
                out.push(value);
                i += 2;
            }
            b'0'..=b'7' => {
                let mut value = (esc - b'0') as u32;
                let mut taken = 0;
                while taken < 2 {
                    match bytes.get(i) {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + (*d - b'0') as u32;
                            i += 1;
                            taken += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            other => {
                if !other.is_ascii() {
                    return Err(encoding("non-ASCII character in byte literal"));
                }
                out.push(b'\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}
