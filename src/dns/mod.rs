//! DNS wire format decoding
//!
//! This module turns raw, possibly hostile, DNS message dumps into
//! structured messages and the findings derived from them:
//! * DNS header, question and resource record parsing
//! * Name decompression with pointer-loop protection
//! * EDNS and DNSSEC presence detection
//! * Bailiwick, CNAME chase and unsolicited record checks
//!
//! # Module Structure
//!
//! * `buffer` - Bounds-checked packet reading and name decompression
//! * `protocol` - Message structures and the total `decode` entry point
//! * `analysis` - Checks run over a decoded response

/// Bounds-checked buffer operations for DNS message handling
pub mod buffer;

/// DNS message structures and decoding
pub mod protocol;

/// Bailiwick, CNAME and section checks over decoded responses
pub mod analysis;

/// DNS record type definitions
pub mod query_type;

/// DNS result code definitions
pub mod result_code;
