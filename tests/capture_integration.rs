//! Integration tests for pcap decoding and traffic classification

use std::net::Ipv4Addr;

use rfmon::capture::packet::Transport;
use rfmon::capture::pcap::{self, CaptureError};
use rfmon::capture::traffic::{summarize, Resolver, RoleTable};
use rfmon::predicates::policy;

const LINKTYPE_ETHERNET: u32 = 1;
const LINKTYPE_LINUX_SLL: u32 = 113;

/// Builds a classic pcap stream in either byte order
struct CaptureBuilder {
    big_endian: bool,
    link_type: u32,
    records: Vec<Vec<u8>>,
}

impl CaptureBuilder {
    fn new(big_endian: bool, link_type: u32) -> CaptureBuilder {
        CaptureBuilder {
            big_endian,
            link_type,
            records: Vec::new(),
        }
    }

    fn u32_bytes(&self, value: u32) -> [u8; 4] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }

    fn frame(mut self, frame: Vec<u8>) -> CaptureBuilder {
        self.records.push(frame);
        self
    }

    fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.u32_bytes(0xa1b2_c3d4));
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&self.u32_bytes(self.link_type));

        for record in &self.records {
            out.extend_from_slice(&[0u8; 8]);
            out.extend_from_slice(&self.u32_bytes(record.len() as u32));
            out.extend_from_slice(&self.u32_bytes(record.len() as u32));
            out.extend_from_slice(record);
        }
        out
    }
}

fn ipv4(protocol: u8, src: [u8; 4], dst: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let total = (20 + payload.len()) as u16;
    let mut out = vec![0x45, 0];
    out.extend_from_slice(&total.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0x40, 0, 64, protocol, 0, 0]);
    out.extend_from_slice(&src);
    out.extend_from_slice(&dst);
    out.extend_from_slice(payload);
    out
}

fn udp_dns(sport: u16, dport: u16, response: bool, extra: usize) -> Vec<u8> {
    let mut dns = vec![0x12, 0x34, if response { 0x81 } else { 0x01 }, 0x00];
    dns.extend(std::iter::repeat(0u8).take(extra));

    let mut out = Vec::new();
    out.extend_from_slice(&sport.to_be_bytes());
    out.extend_from_slice(&dport.to_be_bytes());
    out.extend_from_slice(&((8 + dns.len()) as u16).to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend(dns);
    out
}

fn tcp_ports(sport: u16, dport: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&sport.to_be_bytes());
    out.extend_from_slice(&dport.to_be_bytes());
    out.extend_from_slice(&[0u8; 16]);
    out
}

fn ethernet(ethertype: u16, packet: Vec<u8>) -> Vec<u8> {
    let mut out = vec![0u8; 12];
    out.extend_from_slice(&ethertype.to_be_bytes());
    out.extend(packet);
    out
}

fn linux_cooked(packet: Vec<u8>) -> Vec<u8> {
    let mut out = vec![0u8; 14];
    out.extend_from_slice(&0x0800u16.to_be_bytes());
    out.extend(packet);
    out
}

/// Knot resolver of unit 7 and the lab hosts around it
const RESOLVER: [u8; 4] = [172, 22, 4, 7];
const FORWARDER: [u8; 4] = [172, 22, 201, 7];
const AUTH: [u8; 4] = [172, 22, 50, 9];

fn udp_queries(count: usize) -> Vec<u8> {
    let mut builder = CaptureBuilder::new(true, LINKTYPE_ETHERNET);
    for i in 0..count {
        let query = udp_dns(40000 + i as u16, 53, false, 20);
        builder = builder.frame(ethernet(0x0800, ipv4(17, RESOLVER, AUTH, &query)));
    }
    builder.build()
}

#[test]
fn test_ethernet_big_endian_capture() {
    let query = udp_dns(40000, 53, false, 20);
    let answer = udp_dns(53, 40000, true, 1400);
    let stream = CaptureBuilder::new(true, LINKTYPE_ETHERNET)
        .frame(ethernet(0x0800, ipv4(17, RESOLVER, FORWARDER, &query)))
        .frame(ethernet(0x86dd, vec![0u8; 60]))
        .frame(ethernet(0x0800, ipv4(17, FORWARDER, RESOLVER, &answer)))
        .build();

    let observations = pcap::try_decode(&stream).unwrap();
    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].src, Ipv4Addr::from(RESOLVER));
    assert_eq!(observations[0].dst_port, 53);
    assert_eq!(observations[0].dns_qr, Some(false));
    assert_eq!(observations[1].dns_qr, Some(true));
    assert_eq!(observations[1].size, 8 + 4 + 1400);

    let summary = summarize(&observations, &RoleTable::new(7, Some(Resolver::Knot)));
    assert!(summary.udp_query_seen);
    assert!(summary.forwarder_query_seen);
    assert!(summary.auth_target_correct);
    assert!(summary.response_seen);
    assert!(summary.auth_response_seen);
    assert_eq!(summary.max_udp_response_size, 1412);
    assert!(policy::exceeds_udp_limit(summary.max_udp_response_size as usize));
}

#[test]
fn test_linux_cooked_tcp_capture() {
    let stream = CaptureBuilder::new(false, LINKTYPE_LINUX_SLL)
        .frame(linux_cooked(ipv4(6, RESOLVER, AUTH, &tcp_ports(41000, 53))))
        .frame(linux_cooked(ipv4(6, AUTH, RESOLVER, &tcp_ports(53, 41000))))
        .frame(linux_cooked(ipv4(1, RESOLVER, AUTH, &[8, 0, 0, 0])))
        .build();

    let observations = pcap::decode(&stream);
    assert_eq!(observations.len(), 2);
    assert!(observations.iter().all(|o| o.transport == Transport::Tcp));
    assert!(observations.iter().all(|o| o.size == 0 && o.dns_qr.is_none()));

    let summary = summarize(&observations, &RoleTable::new(7, Some(Resolver::Knot)));
    assert!(summary.tcp_retry_seen);
    assert_eq!(summary.tcp_query_count, 1);
    assert!(summary.response_seen);
    assert!(!summary.udp_query_seen);
}

#[test]
fn test_udp_query_threshold_boundary() {
    let roles = RoleTable::new(7, Some(Resolver::Knot));

    let five = summarize(&pcap::decode(&udp_queries(5)), &roles);
    assert_eq!(five.udp_query_count, 5);
    assert!(five.auth_query_seen);
    assert!(!policy::excessive_udp_queries(five.udp_query_count));

    let six = summarize(&pcap::decode(&udp_queries(6)), &roles);
    assert_eq!(six.udp_query_count, 6);
    assert!(policy::excessive_udp_queries(six.udp_query_count));
}

#[test]
fn test_external_destination_is_unexpected() {
    let query = udp_dns(40000, 53, false, 20);
    let stream = CaptureBuilder::new(false, LINKTYPE_ETHERNET)
        .frame(ethernet(0x0800, ipv4(17, RESOLVER, [8, 8, 8, 8], &query)))
        .build();

    let summary = summarize(&pcap::decode(&stream), &RoleTable::new(7, Some(Resolver::Knot)));
    assert!(summary.unexpected_external);
    assert!(!summary.auth_query_seen);
}

#[test]
fn test_overrunning_record_ends_the_capture() {
    let mut stream = udp_queries(2);
    let full = pcap::decode(&stream).len();
    stream.truncate(stream.len() - 5);

    assert_eq!(full, 2);
    assert_eq!(pcap::decode(&stream).len(), 1);
}

#[test]
fn test_stream_level_failures() {
    assert_eq!(
        pcap::try_decode(&[0u8; 10]),
        Err(CaptureError::TooShort { len: 10 })
    );

    let mut stream = udp_queries(1);
    stream[..4].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    assert!(matches!(
        pcap::try_decode(&stream),
        Err(CaptureError::BadMagic { .. })
    ));
    assert!(pcap::decode(&stream).is_empty());
}
