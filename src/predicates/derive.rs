//! Turning loaded artifacts into a `PredicateSet`

use crate::artifacts::cache;
use crate::artifacts::{ResponseArtifact, RoundArtifacts};
use crate::capture::packet::Transport;
use crate::capture::pcap;
use crate::capture::traffic::{self, Resolver, RoleTable, TrafficSummary};
use crate::dns::analysis::{self, MessageFindings};
use crate::dns::protocol;
use crate::dns::result_code::ResultCode;
use crate::predicates::policy;
use crate::predicates::set::{PredicateSet, RR_KIND_OTHER};
use crate::predicates::vocabulary::Mode;

/// Response side of a round, flattened
#[derive(Debug, Clone)]
struct ResponseFields {
    present: bool,
    timeout: bool,
    malformed: bool,
    transport: Transport,
    id: u16,
    rcode: ResultCode,
    truncated: bool,
    authoritative: bool,
    authed_data: bool,
    dnssec_ok: bool,
    opt_present: bool,
    dnssec_present: bool,
    ancount: u16,
    nscount: u16,
    arcount: u16,
    size: usize,
    port: u16,
    findings: MessageFindings,
}

impl ResponseFields {
    /// No response file at all
    fn absent() -> ResponseFields {
        ResponseFields {
            present: false,
            timeout: false,
            malformed: false,
            transport: Transport::Udp,
            id: 0,
            rcode: ResultCode::RcNotSet,
            truncated: false,
            authoritative: false,
            authed_data: false,
            dnssec_ok: false,
            opt_present: true,
            dnssec_present: false,
            ancount: 0,
            nscount: 0,
            arcount: 0,
            size: 0,
            port: 53,
            findings: MessageFindings::default(),
        }
    }

    /// A response file without a usable message
    fn empty(timeout: bool) -> ResponseFields {
        ResponseFields {
            present: true,
            timeout,
            malformed: !timeout,
            opt_present: false,
            ..ResponseFields::absent()
        }
    }

    fn decoded(raw: &[u8], query_name: &str) -> ResponseFields {
        let msg = protocol::decode(raw);
        let findings = analysis::analyze(&msg, query_name);

        ResponseFields {
            present: true,
            timeout: false,
            malformed: msg.malformed,
            transport: Transport::Udp,
            id: msg.header.id,
            rcode: msg.header.rescode,
            truncated: msg.header.truncated_message,
            authoritative: msg.header.authoritative_answer,
            authed_data: msg.header.authed_data,
            dnssec_ok: msg.dnssec_ok,
            opt_present: msg.opt_present,
            dnssec_present: msg.dnssec_present,
            ancount: msg.header.answers,
            nscount: msg.header.authoritative_entries,
            arcount: msg.header.resource_entries,
            size: msg.size,
            port: 53,
            findings,
        }
    }

    fn from_artifact(response: &ResponseArtifact, query_name: &str) -> ResponseFields {
        match *response {
            ResponseArtifact::Absent => ResponseFields::absent(),
            ResponseArtifact::Timeout => ResponseFields::empty(true),
            ResponseArtifact::Malformed => ResponseFields::empty(false),
            ResponseArtifact::Wire(ref raw) => ResponseFields::decoded(raw, query_name),
        }
    }
}

fn summarize_capture(capture: Option<&[u8]>, unit: u32, resolver: Resolver) -> TrafficSummary {
    match capture {
        Some(stream) => {
            let observations = pcap::decode(stream);
            traffic::summarize(&observations, &RoleTable::new(unit, Some(resolver)))
        }
        None => TrafficSummary::default(),
    }
}

/// Builds the predicate set of one resolver in one round.
///
/// This never fails: every artifact that is missing or unreadable
/// contributes its default values.
pub fn derive(
    mode: Mode,
    unit: u32,
    round: u32,
    resolver: Resolver,
    artifacts: &RoundArtifacts,
) -> PredicateSet {
    let query = &artifacts.query;
    let resp = ResponseFields::from_artifact(&artifacts.response, &query.name);
    let findings = &resp.findings;
    let net = summarize_capture(artifacts.capture.as_deref(), unit, resolver);
    let cache = cache::scan(&artifacts.cache, &query.name);

    PredicateSet {
        mode,
        resolver: resolver.tag(),
        unit_no: unit,
        round_no: round,

        q_id: query.id,
        q_type: query.qtype.predicate_label(),
        query_do: query.dnssec_ok,
        query_rd: query.recursion_desired,
        query_payload_sent: artifacts.query_file_present,
        auth_payload_deployed: artifacts.auth_payload_present,
        dnstap_query_seen: artifacts.dnstap.query_seen,
        dnstap_response_seen: artifacts.dnstap.response_seen,

        response_txt_present: resp.present,
        response_timeout_reported: resp.timeout,
        response_tcp_used: resp.transport == Transport::Tcp,
        q_transport: resp.transport,
        resp_id: resp.id,
        rcode: resp.rcode,
        resp_tc: resp.truncated,
        ancount: resp.ancount,
        nscount: resp.nscount,
        arcount: resp.arcount,
        resp_ad: resp.authed_data,
        resp_do: resp.dnssec_ok,
        resp_aa: resp.authoritative,
        resp_malformed: resp.malformed,
        opt_present: resp.opt_present,
        timeout: resp.timeout,
        dnssec_present: resp.dnssec_present,
        resp_size: resp.size,
        resp_exceeds_1232: policy::exceeds_udp_limit(resp.size),
        resp_exceeds_4096: policy::exceeds_large_limit(resp.size),

        out_of_bailiwick_count: findings.out_of_bailiwick_count,
        out_of_bailiwick_cached: findings.out_of_bailiwick_count > 0,
        unsolicited_ns_count: findings.unsolicited_ns_count,
        unsolicited_a_count: findings.unsolicited_a_count,
        has_unsolicited_ns: findings.unsolicited_ns_count > 0,
        has_unsolicited_glue: findings.unsolicited_a_count > 0,
        invalid_authority_types: findings.invalid_authority_types,
        has_invalid_authority: findings.invalid_authority_types > 0,
        cname_chase_count: findings.cname_chase_count,
        cname_loop_detected: findings.cname_loop_detected,
        excessive_cname_chase: policy::excessive_cname_chase(findings.cname_chase_count),
        id_mismatch: query.id != resp.id,
        negative_cache_indicator: resp.rcode == ResultCode::NXDOMAIN && resp.nscount > 0,
        ttl_zero_exposed: findings.ttl_zero,
        resp_min_ttl: findings.min_ttl,

        pcap_udp_query_seen: net.udp_query_seen,
        pcap_tcp_retry_seen: net.tcp_retry_seen,
        pcap_response_seen: net.response_seen,
        auth_ns_query_seen: net.auth_query_seen,
        auth_ns_response_seen: net.auth_response_seen,
        auth_target_correct: net.auth_target_correct,
        forwarder_query_seen: net.forwarder_query_seen,
        unexpected_external_query: net.unexpected_external,
        udp_query_count: net.udp_query_count,
        tcp_query_count: net.tcp_query_count,
        excessive_udp_queries: policy::excessive_udp_queries(net.udp_query_count),
        excessive_tcp_queries: policy::excessive_tcp_queries(net.tcp_query_count),
        rd_zero_but_forwarded: !query.recursion_desired && net.forwarder_query_seen,
        max_upstream_resp_size: net.max_udp_response_size,
        large_upstream_accepted: policy::exceeds_udp_limit(net.max_udp_response_size as usize),
        tcp_fallback_seen: net.tcp_retry_seen,
        auth_source_expected: net.auth_target_correct,
        resp_port: resp.port,
        resp_from_unexpected_port: policy::unexpected_port(resp.port),

        log_error_seen: artifacts.cache.log_error_seen,
        log_tcp_fallback_decided: false,
        log_formerr_or_notimp: false,
        cache_written: artifacts.cache.written,
        cache_neg_present: cache.negative_present,
        cache_min_ttl: cache.min_ttl,
        any_cache_rrset_present: cache.any_rrset,
        cached_ns_count: cache.ns_count,
        cached_a_count: cache.addr_count,
        out_of_bailiwick_in_cache: cache.out_of_bailiwick,
        invalid_types_in_cache: false,
        any_ans_rrset_present: resp.ancount > 0,

        server_behaved_nonidempotent: false,
        opt_padding_unusual: false,
        prev_negative_ttl: -1,
        time_since_prev: 0,
        rr_kind: RR_KIND_OTHER,
    }
}
