//! Integration tests for the DNS wire decoder and response analysis

use rfmon::dns::analysis;
use rfmon::dns::buffer::{read_name, NameDecodeState, NameError};
use rfmon::dns::protocol::{self, Section};
use rfmon::dns::query_type::QueryType;
use rfmon::dns::result_code::ResultCode;

fn header(id: u16, flags: u16, qd: u16, an: u16, ns: u16, ar: u16) -> Vec<u8> {
    let mut out = Vec::new();
    for field in [id, flags, qd, an, ns, ar].iter() {
        out.extend_from_slice(&field.to_be_bytes());
    }
    out
}

fn name(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in text.split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

fn record(owner: &[u8], rtype: u16, class: u16, ttl: u32, rdata: &[u8]) -> Vec<u8> {
    let mut out = owner.to_vec();
    out.extend_from_slice(&rtype.to_be_bytes());
    out.extend_from_slice(&class.to_be_bytes());
    out.extend_from_slice(&ttl.to_be_bytes());
    out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    out.extend_from_slice(rdata);
    out
}

fn question(qname: &str, qtype: u16) -> Vec<u8> {
    let mut out = name(qname);
    out.extend_from_slice(&qtype.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out
}

/// Pointer to the question name, which always starts right after the header
const QNAME_PTR: [u8; 2] = [0xC0, 0x0C];

#[test]
fn test_nxdomain_with_soa_authority() {
    let raw = hex::decode("abcd81830000000000010000000006000100000e100000").unwrap();
    let msg = protocol::decode(&raw);

    assert!(!msg.malformed);
    assert_eq!(msg.header.id, 0xabcd);
    assert_eq!(msg.header.rescode, ResultCode::NXDOMAIN);
    assert_eq!(msg.header.answers, 0);
    assert_eq!(msg.header.authoritative_entries, 1);
    assert_eq!(msg.authorities.len(), 1);
    assert_eq!(msg.authorities[0].rtype, QueryType::Soa);
    assert_eq!(msg.authorities[0].name, ".");
    assert_eq!(msg.min_ttl(), 3600);
    assert_eq!(msg.size, raw.len());
}

#[test]
fn test_minimal_header() {
    let raw = header(0, 0, 0, 0, 0, 0);
    let msg = protocol::decode(&raw);
    let findings = analysis::analyze(&msg, "");

    assert!(!msg.malformed);
    assert_eq!(msg.record_count(), 0);
    assert_eq!(msg.header.answers, 0);
    assert_eq!(msg.header.authoritative_entries, 0);
    assert_eq!(msg.header.resource_entries, 0);
    assert_eq!(findings.min_ttl, -1);
    assert!(!findings.ttl_zero);
}

#[test]
fn test_self_pointer_returns_promptly() {
    let mut state = NameDecodeState::new();
    let err = read_name(&[0xC0, 0x00], 0, &mut state).unwrap_err();

    assert!(matches!(err, NameError::PointerLoop { .. }));
    assert_eq!(err.partial(), "");
}

#[test]
fn test_mutual_pointers_keep_partial_name() {
    let buf = [
        3, b'f', b'o', b'o', 0xC0, 0x06, //
        3, b'b', b'a', b'r', 0xC0, 0x00,
    ];
    let mut state = NameDecodeState::new();
    let err = read_name(&buf, 0, &mut state).unwrap_err();

    assert!(matches!(err, NameError::PointerLoop { .. }));
    assert_eq!(err.partial(), "foo.bar");
}

#[test]
fn test_looping_question_stops_record_parsing() {
    let mut raw = header(7, 0x8180, 1, 1, 0, 0);
    raw.extend_from_slice(&QNAME_PTR);
    raw.extend_from_slice(&[0, 1, 0, 1]);
    raw.extend(record(&QNAME_PTR, 1, 1, 300, &[1, 2, 3, 4]));

    let msg = protocol::decode(&raw);
    assert!(!msg.malformed);
    assert_eq!(msg.header.answers, 1);
    assert!(msg.answers.is_empty());
}

#[test]
fn test_truncated_record_keeps_earlier_ones() {
    let mut raw = header(9, 0x8180, 1, 2, 0, 0);
    raw.extend(question("example.com", 1));
    raw.extend(record(&QNAME_PTR, 1, 1, 300, &[192, 0, 2, 1]));
    let second = record(&QNAME_PTR, 1, 1, 300, &[192, 0, 2, 2]);
    raw.extend_from_slice(&second[..second.len() - 2]);

    let msg = protocol::decode(&raw);
    assert!(!msg.malformed);
    assert_eq!(msg.header.answers, 2);
    assert_eq!(msg.answers.len(), 1);
    assert_eq!(msg.answers[0].name, "example.com.");
}

#[test]
fn test_out_of_range_owner_pointer_keeps_parsing() {
    let mut raw = header(0x0a0b, 0x8180, 1, 2, 0, 0);
    raw.extend(question("example.com", 1));
    raw.extend(record(&[0xff, 0xff], 1, 1, 120, &[192, 0, 2, 1]));
    raw.extend(record(&QNAME_PTR, 1, 1, 300, &[192, 0, 2, 2]));

    let msg = protocol::decode(&raw);
    assert!(!msg.malformed);
    assert_eq!(msg.answers.len(), 2);
    assert_eq!(msg.answers[0].name, ".");
    assert_eq!(msg.answers[0].rdata, vec![192, 0, 2, 1]);
    assert_eq!(msg.answers[1].name, "example.com.");
    assert_eq!(msg.min_ttl(), 120);
}

#[test]
fn test_bailiwick_and_unsolicited_counting() {
    let mut raw = header(0x0102, 0x8180, 1, 1, 2, 3);
    raw.extend(question("www.example.com", 1));
    raw.extend(record(&QNAME_PTR, 1, 1, 300, &[192, 0, 2, 1]));
    raw.extend(record(&name("evil.org"), 2, 1, 60, &name("ns.evil.org")));
    raw.extend(record(&name("evil.org"), 2, 1, 60, &name("ns2.evil.org")));
    raw.extend(record(&name("ns.evil.org"), 1, 1, 120, &[203, 0, 113, 9]));
    raw.extend(record(&name("ns.example.com"), 1, 1, 120, &[192, 0, 2, 53]));
    raw.extend(record(&[0], 41, 4096, 0x0000_8000, &[]));

    let msg = protocol::decode(&raw);
    assert_eq!(msg.answers.len(), 1);
    assert_eq!(msg.authorities.len(), 2);
    assert_eq!(msg.resources.len(), 3);
    assert!(msg.opt_present);
    assert!(msg.dnssec_ok);
    assert!(!msg.dnssec_present);

    let findings = analysis::analyze(&msg, "www.example.com.");
    assert_eq!(findings.out_of_bailiwick_count, 3);
    assert_eq!(findings.unsolicited_ns_count, 2);
    assert_eq!(findings.unsolicited_a_count, 2);
    assert_eq!(findings.invalid_authority_types, 0);
    assert_eq!(findings.min_ttl, 60);
}

#[test]
fn test_empty_query_name_uses_response_question() {
    let mut raw = header(1, 0x8180, 1, 0, 1, 0);
    raw.extend(question("a.example.net", 1));
    raw.extend(record(&name("other.org"), 6, 1, 30, &[]));

    let msg = protocol::decode(&raw);
    assert_eq!(msg.question.name, "a.example.net.");
    assert_eq!(analysis::analyze(&msg, "").out_of_bailiwick_count, 1);
}

#[test]
fn test_self_referencing_cname_on_the_wire() {
    let mut raw = header(3, 0x8180, 1, 1, 0, 0);
    raw.extend(question("loop.example.com", 5));
    raw.extend(record(&QNAME_PTR, 5, 1, 0, &QNAME_PTR));

    let msg = protocol::decode(&raw);
    assert_eq!(msg.answers[0].section, Section::Answer);
    assert_eq!(
        msg.answers[0].cname_target.as_deref(),
        Some("loop.example.com.")
    );

    let findings = analysis::analyze(&msg, "loop.example.com");
    assert_eq!(findings.cname_chase_count, 1);
    assert!(findings.cname_loop_detected);
    assert!(findings.ttl_zero);
    assert_eq!(findings.min_ttl, 0);
}

#[test]
fn test_dnssec_records_are_flagged() {
    let mut raw = header(4, 0x81a0, 1, 2, 0, 0);
    raw.extend(question("example.com", 1));
    raw.extend(record(&QNAME_PTR, 1, 1, 300, &[192, 0, 2, 1]));
    raw.extend(record(&QNAME_PTR, 46, 1, 300, &[0; 18]));

    let msg = protocol::decode(&raw);
    assert!(msg.header.authed_data);
    assert!(msg.dnssec_present);
    assert!(!msg.opt_present);
}
