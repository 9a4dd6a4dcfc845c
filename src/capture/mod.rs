//! Packet capture decoding
//!
//! # Module Structure
//!
//! * `pcap` - Capture container parsing
//! * `packet` - Per-frame link, IPv4 and transport extraction
//! * `traffic` - Lab role table and upstream traffic counters

/// libpcap container parsing
pub mod pcap;

/// Frame level header extraction
pub mod packet;

/// Role classification of observed packets
pub mod traffic;
