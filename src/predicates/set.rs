//! One observation per (unit, round, resolver)

use crate::capture::packet::Transport;
use crate::dns::result_code::ResultCode;
use crate::predicates::vocabulary::{Mode, PredicateKey, PredicateValue};

/// Only value `rr_kind` takes so far
pub const RR_KIND_OTHER: &str = "RR_OTHER";

/// Every predicate of the vocabulary as a typed field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredicateSet {
    pub mode: Mode,
    pub resolver: String,
    pub unit_no: u32,
    pub round_no: u32,

    pub q_id: u16,
    pub q_type: &'static str,
    pub query_do: bool,
    pub query_rd: bool,
    pub query_payload_sent: bool,
    pub auth_payload_deployed: bool,
    pub dnstap_query_seen: bool,
    pub dnstap_response_seen: bool,

    pub response_txt_present: bool,
    pub response_timeout_reported: bool,
    pub response_tcp_used: bool,
    pub q_transport: Transport,
    pub resp_id: u16,
    pub rcode: ResultCode,
    pub resp_tc: bool,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
    pub resp_ad: bool,
    pub resp_do: bool,
    pub resp_aa: bool,
    pub resp_malformed: bool,
    pub opt_present: bool,
    pub timeout: bool,
    pub dnssec_present: bool,
    pub resp_size: usize,
    pub resp_exceeds_1232: bool,
    pub resp_exceeds_4096: bool,

    pub out_of_bailiwick_count: u32,
    pub out_of_bailiwick_cached: bool,
    pub unsolicited_ns_count: u32,
    pub unsolicited_a_count: u32,
    pub has_unsolicited_ns: bool,
    pub has_unsolicited_glue: bool,
    pub invalid_authority_types: u32,
    pub has_invalid_authority: bool,
    pub cname_chase_count: u32,
    pub cname_loop_detected: bool,
    pub excessive_cname_chase: bool,
    pub id_mismatch: bool,
    pub negative_cache_indicator: bool,
    pub ttl_zero_exposed: bool,
    pub resp_min_ttl: i64,

    pub pcap_udp_query_seen: bool,
    pub pcap_tcp_retry_seen: bool,
    pub pcap_response_seen: bool,
    pub auth_ns_query_seen: bool,
    pub auth_ns_response_seen: bool,
    pub auth_target_correct: bool,
    pub forwarder_query_seen: bool,
    pub unexpected_external_query: bool,
    pub udp_query_count: u32,
    pub tcp_query_count: u32,
    pub excessive_udp_queries: bool,
    pub excessive_tcp_queries: bool,
    pub rd_zero_but_forwarded: bool,
    pub max_upstream_resp_size: u16,
    pub large_upstream_accepted: bool,
    pub tcp_fallback_seen: bool,
    pub auth_source_expected: bool,
    pub resp_port: u16,
    pub resp_from_unexpected_port: bool,

    pub log_error_seen: bool,
    pub log_tcp_fallback_decided: bool,
    pub log_formerr_or_notimp: bool,
    pub cache_written: bool,
    pub cache_neg_present: bool,
    pub cache_min_ttl: i64,
    pub any_cache_rrset_present: bool,
    pub cached_ns_count: u32,
    pub cached_a_count: u32,
    pub out_of_bailiwick_in_cache: bool,
    pub invalid_types_in_cache: bool,
    pub any_ans_rrset_present: bool,

    pub server_behaved_nonidempotent: bool,
    pub opt_padding_unusual: bool,
    pub prev_negative_ttl: i64,
    pub time_since_prev: i64,
    pub rr_kind: &'static str,
}

fn transport_name(transport: Transport) -> &'static str {
    match transport {
        Transport::Udp => "UDP",
        Transport::Tcp => "TCP",
    }
}

impl PredicateSet {
    pub fn get(&self, key: PredicateKey) -> PredicateValue {
        match key {
            PredicateKey::Mode => self.mode.as_str().into(),
            PredicateKey::Resolver => self.resolver.as_str().into(),
            PredicateKey::UnitNo => self.unit_no.into(),
            PredicateKey::RoundNo => self.round_no.into(),
            PredicateKey::QId => self.q_id.into(),
            PredicateKey::QType => self.q_type.into(),
            PredicateKey::QueryDo => self.query_do.into(),
            PredicateKey::QueryRd => self.query_rd.into(),
            PredicateKey::QueryPayloadSent => self.query_payload_sent.into(),
            PredicateKey::AuthPayloadDeployed => self.auth_payload_deployed.into(),
            PredicateKey::DnstapQuerySeen => self.dnstap_query_seen.into(),
            PredicateKey::DnstapResponseSeen => self.dnstap_response_seen.into(),
            PredicateKey::ResponseTxtPresent => self.response_txt_present.into(),
            PredicateKey::ResponseTimeoutReported => self.response_timeout_reported.into(),
            PredicateKey::ResponseTcpUsed => self.response_tcp_used.into(),
            PredicateKey::QTransport => transport_name(self.q_transport).into(),
            PredicateKey::RespId => self.resp_id.into(),
            PredicateKey::Rcode => self.rcode.as_str().into(),
            PredicateKey::RespTc => self.resp_tc.into(),
            PredicateKey::Ancount => self.ancount.into(),
            PredicateKey::Nscount => self.nscount.into(),
            PredicateKey::Arcount => self.arcount.into(),
            PredicateKey::RespAd => self.resp_ad.into(),
            PredicateKey::RespDo => self.resp_do.into(),
            PredicateKey::RespAa => self.resp_aa.into(),
            PredicateKey::RespMalformed => self.resp_malformed.into(),
            PredicateKey::OptPresent => self.opt_present.into(),
            PredicateKey::Timeout => self.timeout.into(),
            PredicateKey::DnssecPresent => self.dnssec_present.into(),
            PredicateKey::RespSize => self.resp_size.into(),
            PredicateKey::RespExceeds1232 => self.resp_exceeds_1232.into(),
            PredicateKey::RespExceeds4096 => self.resp_exceeds_4096.into(),
            PredicateKey::OutOfBailiwickCount => self.out_of_bailiwick_count.into(),
            PredicateKey::OutOfBailiwickCached => self.out_of_bailiwick_cached.into(),
            PredicateKey::UnsolicitedNsCount => self.unsolicited_ns_count.into(),
            PredicateKey::UnsolicitedACount => self.unsolicited_a_count.into(),
            PredicateKey::HasUnsolicitedNs => self.has_unsolicited_ns.into(),
            PredicateKey::HasUnsolicitedGlue => self.has_unsolicited_glue.into(),
            PredicateKey::InvalidAuthorityTypes => self.invalid_authority_types.into(),
            PredicateKey::HasInvalidAuthority => self.has_invalid_authority.into(),
            PredicateKey::CnameChaseCount => self.cname_chase_count.into(),
            PredicateKey::CnameLoopDetected => self.cname_loop_detected.into(),
            PredicateKey::ExcessiveCnameChase => self.excessive_cname_chase.into(),
            PredicateKey::IdMismatch => self.id_mismatch.into(),
            PredicateKey::NegativeCacheIndicator => self.negative_cache_indicator.into(),
            PredicateKey::TtlZeroExposed => self.ttl_zero_exposed.into(),
            PredicateKey::RespMinTtl => self.resp_min_ttl.into(),
            PredicateKey::PcapUdpQuerySeen => self.pcap_udp_query_seen.into(),
            PredicateKey::PcapTcpRetrySeen => self.pcap_tcp_retry_seen.into(),
            PredicateKey::PcapResponseSeen => self.pcap_response_seen.into(),
            PredicateKey::AuthNsQuerySeen => self.auth_ns_query_seen.into(),
            PredicateKey::AuthNsResponseSeen => self.auth_ns_response_seen.into(),
            PredicateKey::AuthTargetCorrect => self.auth_target_correct.into(),
            PredicateKey::ForwarderQuerySeen => self.forwarder_query_seen.into(),
            PredicateKey::UnexpectedExternalQuery => self.unexpected_external_query.into(),
            PredicateKey::UdpQueryCount => self.udp_query_count.into(),
            PredicateKey::TcpQueryCount => self.tcp_query_count.into(),
            PredicateKey::ExcessiveUdpQueries => self.excessive_udp_queries.into(),
            PredicateKey::ExcessiveTcpQueries => self.excessive_tcp_queries.into(),
            PredicateKey::RdZeroButForwarded => self.rd_zero_but_forwarded.into(),
            PredicateKey::MaxUpstreamRespSize => self.max_upstream_resp_size.into(),
            PredicateKey::LargeUpstreamAccepted => self.large_upstream_accepted.into(),
            PredicateKey::TcpFallbackSeen => self.tcp_fallback_seen.into(),
            PredicateKey::AuthSourceExpected => self.auth_source_expected.into(),
            PredicateKey::RespPort => self.resp_port.into(),
            PredicateKey::RespFromUnexpectedPort => self.resp_from_unexpected_port.into(),
            PredicateKey::LogErrorSeen => self.log_error_seen.into(),
            PredicateKey::LogTcpFallbackDecided => self.log_tcp_fallback_decided.into(),
            PredicateKey::LogFormerrOrNotimp => self.log_formerr_or_notimp.into(),
            PredicateKey::CacheWritten => self.cache_written.into(),
            PredicateKey::CacheNegPresent => self.cache_neg_present.into(),
            PredicateKey::CacheMinTtl => self.cache_min_ttl.into(),
            PredicateKey::AnyCacheRrsetPresent => self.any_cache_rrset_present.into(),
            PredicateKey::CachedNsCount => self.cached_ns_count.into(),
            PredicateKey::CachedACount => self.cached_a_count.into(),
            PredicateKey::OutOfBailiwickInCache => self.out_of_bailiwick_in_cache.into(),
            PredicateKey::InvalidTypesInCache => self.invalid_types_in_cache.into(),
            PredicateKey::AnyAnsRrsetPresent => self.any_ans_rrset_present.into(),
            PredicateKey::ServerBehavedNonidempotent => self.server_behaved_nonidempotent.into(),
            PredicateKey::OptPaddingUnusual => self.opt_padding_unusual.into(),
            PredicateKey::PrevNegativeTtl => self.prev_negative_ttl.into(),
            PredicateKey::TimeSincePrev => self.time_since_prev.into(),
            PredicateKey::RrKind => self.rr_kind.into(),
        }
    }

    /// All predicates in emission order
    pub fn iter(&self) -> impl Iterator<Item = (PredicateKey, PredicateValue)> + '_ {
        PredicateKey::ALL.iter().map(move |key| (*key, self.get(*key)))
    }
}
