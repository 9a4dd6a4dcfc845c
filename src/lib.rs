//! rfmon
//!
//! Turns the artifacts of a DNS resolver fuzzing campaign into behavioral
//! predicates and streams them to an external runtime-verification monitor.
//!
//! # Features
//!
//! * DNS wire-format decoding that tolerates hostile input (pointer cycles,
//!   truncated records, oversized responses)
//! * pcap decoding for Ethernet, Linux cooked and raw IP captures
//! * Cache dump and resolver log scanning
//! * A fixed predicate vocabulary with typed values
//! * Crash-tolerant monitor subprocesses, one per resolver
//!
//! # Architecture
//!
//! * `dns` - Wire format decoding and message analysis
//! * `capture` - Packet capture decoding and traffic classification
//! * `artifacts` - Loading the files a fuzzing round leaves behind
//! * `predicates` - Predicate vocabulary and derivation
//! * `monitor` - Monitor process supervision and the line protocol
//! * `round` - Walking the results tree

#[macro_use]
pub mod error_utils;

/// DNS wire format decoding
pub mod dns;

/// Packet capture decoding
pub mod capture;

/// Round artifact loaders
pub mod artifacts;

/// Predicate vocabulary and derivation
pub mod predicates;

/// Monitor bridge
pub mod monitor;

pub mod config;

pub mod round;
