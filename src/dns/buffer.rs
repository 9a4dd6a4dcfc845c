//! Bounds-checked reading over an untrusted DNS message
//!
//! Every accessor returns a `Result` instead of indexing, so a hostile or
//! truncated buffer can only ever end a decode early. Name decompression
//! lives here as well since it is the one place where the read position
//! can jump backwards.

use std::collections::HashSet;

use derive_more::{Display, Error};

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[display(fmt = "end of buffer: wanted {} bytes at offset {}", wanted, pos)]
    EndOfBuffer { pos: usize, wanted: usize },
}

type Result<T> = std::result::Result<T, BufferError>;

/// Outcome of a name decode that could not reach the terminating label.
///
/// Both variants carry the labels collected before the failure, joined by
/// dots and without a trailing dot, so callers can still inspect them.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[display(fmt = "compression pointer loop at offset {}", offset)]
    PointerLoop { offset: usize, partial: String },
    #[display(fmt = "name truncated at offset {}", offset)]
    Truncated { offset: usize, partial: String },
}

impl NameError {
    pub fn partial(&self) -> &str {
        match self {
            NameError::PointerLoop { partial, .. } => partial,
            NameError::Truncated { partial, .. } => partial,
        }
    }

    pub fn into_partial(self) -> String {
        match self {
            NameError::PointerLoop { partial, .. } => partial,
            NameError::Truncated { partial, .. } => partial,
        }
    }
}

/// Offsets visited while decoding a single name.
///
/// Reset before every name; a second visit to any offset ends the decode.
#[derive(Debug, Default)]
pub struct NameDecodeState {
    visited: HashSet<usize>,
}

impl NameDecodeState {
    pub fn new() -> NameDecodeState {
        NameDecodeState {
            visited: HashSet::new(),
        }
    }

    pub fn reset(&mut self) {
        self.visited.clear();
    }

    /// Records `offset`, returning false if it was already visited.
    pub fn visit(&mut self, offset: usize) -> bool {
        self.visited.insert(offset)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Read cursor over a borrowed message
#[derive(Debug, Clone)]
pub struct PacketBuffer<'a> {
    buf: &'a [u8],
    pub pos: usize,
}

impl<'a> PacketBuffer<'a> {
    pub fn new(buf: &'a [u8]) -> PacketBuffer<'a> {
        PacketBuffer { buf, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.buf
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(BufferError::EndOfBuffer { pos, wanted: 0 });
        }
        self.pos = pos;

        Ok(())
    }

    pub fn step(&mut self, steps: usize) -> Result<()> {
        self.ensure(steps)?;
        self.pos += steps;

        Ok(())
    }

    fn ensure(&self, wanted: usize) -> Result<()> {
        match self.pos.checked_add(wanted) {
            Some(end) if end <= self.buf.len() => Ok(()),
            _ => Err(BufferError::EndOfBuffer {
                pos: self.pos,
                wanted,
            }),
        }
    }

    pub fn get_range(&self, start: usize, len: usize) -> Result<&'a [u8]> {
        match start.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(&self.buf[start..end]),
            _ => Err(BufferError::EndOfBuffer { pos: start, wanted: len }),
        }
    }

    pub fn read_range(&mut self, len: usize) -> Result<&'a [u8]> {
        let range = self.get_range(self.pos, len)?;
        self.pos += len;

        Ok(range)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let res = self.buf[self.pos];
        self.pos += 1;

        Ok(res)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_range(2)?;

        Ok(((bytes[0] as u16) << 8) | (bytes[1] as u16))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_range(4)?;

        Ok(((bytes[0] as u32) << 24)
            | ((bytes[1] as u32) << 16)
            | ((bytes[2] as u32) << 8)
            | (bytes[3] as u32))
    }

    /// Reads a possibly compressed name at the current position and moves
    /// past it. On failure the position is left untouched.
    pub fn read_qname(
        &mut self,
        state: &mut NameDecodeState,
    ) -> std::result::Result<String, NameError> {
        let (name, next) = read_name(self.buf, self.pos, state)?;
        self.pos = next;

        Ok(name)
    }
}

/// Decodes the name starting at `offset`.
///
/// Returns the rendered name (trailing-dot terminated, `"."` for the root)
/// and the offset just past it in the original byte stream: past the
/// terminating zero label, or past the first compression pointer followed.
/// A pointer or label sequence that leaves the buffer ends the name early.
/// The loop runs at most `buf.len() + 1` times since every iteration visits
/// a fresh offset.
pub fn read_name(
    buf: &[u8],
    offset: usize,
    state: &mut NameDecodeState,
) -> std::result::Result<(String, usize), NameError> {
    state.reset();

    if offset >= buf.len() {
        return Err(NameError::Truncated {
            offset,
            partial: String::new(),
        });
    }

    let mut labels: Vec<String> = Vec::new();
    let mut pos = offset;
    let mut return_pos: Option<usize> = None;

    for _ in 0..=buf.len() {
        // Leaving the buffer ends the name with what was read so far
        if pos >= buf.len() {
            let next = return_pos.unwrap_or(pos);
            return Ok((render_name(&labels), next));
        }
        if !state.visit(pos) {
            return Err(NameError::PointerLoop {
                offset: pos,
                partial: labels.join("."),
            });
        }

        let len = buf[pos];

        if len == 0 {
            let next = return_pos.unwrap_or(pos + 1);
            return Ok((render_name(&labels), next));
        }

        if (len & 0xC0) == 0xC0 {
            if pos + 1 >= buf.len() {
                return Err(NameError::Truncated {
                    offset: pos,
                    partial: labels.join("."),
                });
            }
            let target = (((len as usize) & 0x3F) << 8) | buf[pos + 1] as usize;
            if return_pos.is_none() {
                return_pos = Some(pos + 2);
            }
            pos = target;
            continue;
        }

        let start = pos + 1;
        let end = start + len as usize;
        if end > buf.len() {
            return Err(NameError::Truncated {
                offset: pos,
                partial: labels.join("."),
            });
        }
        labels.push(decode_label(&buf[start..end]));
        pos = end;
    }

    Err(NameError::PointerLoop {
        offset: pos,
        partial: labels.join("."),
    })
}

fn render_name(labels: &[String]) -> String {
    if labels.is_empty() {
        return ".".to_string();
    }

    let mut name = labels.join(".");
    name.push('.');
    name
}

/// Label bytes outside ASCII become U+FFFD; nothing here is fatal.
fn decode_label(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
        .collect()
}
