//! libpcap stream decoding
//!
//! Only the classic pcap container is understood. The global header is
//! validated once, then records are walked until the stream ends or a record
//! claims more bytes than remain.

use derive_more::{Display, Error};

use crate::capture::packet::{decode_frame, LinkFraming, NetworkObservation};

pub const GLOBAL_HEADER_LEN: usize = 24;
pub const RECORD_HEADER_LEN: usize = 16;

const MAGIC_MICROS: u32 = 0xa1b2_c3d4;
const MAGIC_NANOS: u32 = 0xa1b2_3c4d;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[display(fmt = "capture of {} bytes has no global header", len)]
    TooShort { len: usize },
    #[display(fmt = "unknown pcap magic {:#010x}", magic)]
    BadMagic { magic: u32 },
}

type Result<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn detect(header: &[u8]) -> Result<ByteOrder> {
        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        match magic {
            MAGIC_MICROS | MAGIC_NANOS => Ok(ByteOrder::Little),
            m if m.swap_bytes() == MAGIC_MICROS || m.swap_bytes() == MAGIC_NANOS => {
                Ok(ByteOrder::Big)
            }
            magic => Err(CaptureError::BadMagic { magic }),
        }
    }

    fn u32_at(self, data: &[u8], offset: usize) -> u32 {
        let bytes = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// Global header fields this decoder cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHeader {
    pub link_type: u32,
    pub framing: LinkFraming,
}

fn read_header(stream: &[u8]) -> Result<(ByteOrder, CaptureHeader)> {
    if stream.len() < GLOBAL_HEADER_LEN {
        return Err(CaptureError::TooShort { len: stream.len() });
    }

    let order = ByteOrder::detect(stream)?;
    let link_type = order.u32_at(stream, 20);

    Ok((
        order,
        CaptureHeader {
            link_type,
            framing: LinkFraming::for_link_type(link_type),
        },
    ))
}

/// Iterates the raw frames of a capture
struct Frames<'a> {
    stream: &'a [u8],
    order: ByteOrder,
    pos: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let header_end = self.pos.checked_add(RECORD_HEADER_LEN)?;
        if header_end > self.stream.len() {
            return None;
        }

        let incl_len = self.order.u32_at(self.stream, self.pos + 8) as usize;
        let end = match header_end.checked_add(incl_len) {
            Some(end) if end <= self.stream.len() => end,
            _ => {
                log::debug!(
                    "capture truncated: record at {} claims {} bytes",
                    self.pos,
                    incl_len
                );
                self.pos = self.stream.len();
                return None;
            }
        };

        self.pos = end;
        Some(&self.stream[header_end..end])
    }
}

/// Decodes every recognized IPv4 UDP/TCP packet in capture order.
pub fn try_decode(stream: &[u8]) -> Result<Vec<NetworkObservation>> {
    let (order, header) = read_header(stream)?;

    let frames = Frames {
        stream,
        order,
        pos: GLOBAL_HEADER_LEN,
    };

    let mut observations = Vec::new();
    for (index, frame) in frames.enumerate() {
        match decode_frame(frame, &header.framing) {
            Ok(obs) => observations.push(obs),
            Err(e) => log::trace!("frame {} skipped: {}", index, e),
        }
    }

    Ok(observations)
}

/// Like `try_decode`, with an unreadable stream yielding no observations.
pub fn decode(stream: &[u8]) -> Vec<NetworkObservation> {
    match try_decode(stream) {
        Ok(observations) => observations,
        Err(e) => {
            log::debug!("capture ignored: {}", e);
            Vec::new()
        }
    }
}
