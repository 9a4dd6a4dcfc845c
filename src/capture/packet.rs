//! Link, IPv4 and transport header extraction for a single captured frame

use std::net::Ipv4Addr;

use derive_more::{Display, Error};

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const IPV4_MIN_HEADER_LEN: usize = 20;
pub const UDP_HEADER_LEN: usize = 8;

const PROTO_TCP: u8 = 6;
const PROTO_UDP: u8 = 17;

/// Where the IP packet starts inside a frame of a given link type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFraming {
    pub header_len: usize,
    /// Offset of the big-endian ethertype field, `None` for raw IP links
    pub ethertype_offset: Option<usize>,
}

impl LinkFraming {
    pub const ETHERNET: LinkFraming = LinkFraming {
        header_len: 14,
        ethertype_offset: Some(12),
    };

    /// Unknown link types are treated as Ethernet.
    pub fn for_link_type(link_type: u32) -> LinkFraming {
        match link_type {
            // DLT_EN10MB
            1 => LinkFraming::ETHERNET,
            // LINUX_SLL
            113 => LinkFraming {
                header_len: 16,
                ethertype_offset: Some(14),
            },
            // LINUX_SLL2
            276 => LinkFraming {
                header_len: 20,
                ethertype_offset: Some(0),
            },
            // DLT_RAW on its various numbers, and LINKTYPE_IPV4
            12 | 101 | 228 => LinkFraming {
                header_len: 0,
                ethertype_offset: None,
            },
            _ => LinkFraming::ETHERNET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Udp,
    Tcp,
}

/// One recognized transport packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkObservation {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub transport: Transport,
    pub src_port: u16,
    pub dst_port: u16,
    /// QR bit of a DNS header following the UDP header, when one fits
    pub dns_qr: Option<bool>,
    /// Declared UDP length; zero for TCP
    pub size: u16,
}

/// Why a frame produced no observation
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[display(fmt = "frame of {} bytes, needed {}", len, needed)]
    TooShort { len: usize, needed: usize },
    #[display(fmt = "ethertype {:#06x} is not IPv4", ethertype)]
    NotIpv4 { ethertype: u16 },
    #[display(fmt = "IP version {}", version)]
    IpVersion { version: u8 },
    #[display(fmt = "IP protocol {} not inspected", protocol)]
    UnsupportedProtocol { protocol: u8 },
}

type Result<T> = std::result::Result<T, FrameError>;

fn be_u16(frame: &[u8], offset: usize) -> u16 {
    ((frame[offset] as u16) << 8) | frame[offset + 1] as u16
}

fn require(frame: &[u8], needed: usize) -> Result<()> {
    if frame.len() < needed {
        return Err(FrameError::TooShort {
            len: frame.len(),
            needed,
        });
    }
    Ok(())
}

/// Extracts the observation carried by `frame`.
pub fn decode_frame(frame: &[u8], framing: &LinkFraming) -> Result<NetworkObservation> {
    let ip = framing.header_len;
    require(frame, ip + IPV4_MIN_HEADER_LEN)?;

    if let Some(offset) = framing.ethertype_offset {
        let ethertype = be_u16(frame, offset);
        if ethertype != ETHERTYPE_IPV4 {
            return Err(FrameError::NotIpv4 { ethertype });
        }
    }

    let version = frame[ip] >> 4;
    if version != 4 {
        return Err(FrameError::IpVersion { version });
    }

    let ihl = ((frame[ip] & 0x0F) as usize) * 4;
    require(frame, ip + ihl)?;

    let protocol = frame[ip + 9];
    let src = Ipv4Addr::new(frame[ip + 12], frame[ip + 13], frame[ip + 14], frame[ip + 15]);
    let dst = Ipv4Addr::new(frame[ip + 16], frame[ip + 17], frame[ip + 18], frame[ip + 19]);

    let transport = ip + ihl;

    match protocol {
        PROTO_UDP => {
            require(frame, transport + UDP_HEADER_LEN)?;

            let dns = transport + UDP_HEADER_LEN;
            let dns_qr = if frame.len() >= dns + 4 {
                Some(frame[dns + 2] & 0x80 != 0)
            } else {
                None
            };

            Ok(NetworkObservation {
                src,
                dst,
                transport: Transport::Udp,
                src_port: be_u16(frame, transport),
                dst_port: be_u16(frame, transport + 2),
                dns_qr,
                size: be_u16(frame, transport + 4),
            })
        }
        PROTO_TCP => {
            require(frame, transport + 4)?;

            Ok(NetworkObservation {
                src,
                dst,
                transport: Transport::Tcp,
                src_port: be_u16(frame, transport),
                dst_port: be_u16(frame, transport + 2),
                dns_qr: None,
                size: 0,
            })
        }
        protocol => Err(FrameError::UnsupportedProtocol { protocol }),
    }
}
