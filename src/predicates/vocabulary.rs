//! The fixed predicate vocabulary understood by the monitor

use std::fmt;

macro_rules! vocabulary {
    ($($key:ident => $name:literal,)*) => {
        /// Every predicate, in emission order
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum PredicateKey {
            $($key,)*
        }

        impl PredicateKey {
            pub const ALL: &'static [PredicateKey] = &[$(PredicateKey::$key,)*];

            pub fn as_str(&self) -> &'static str {
                match *self {
                    $(PredicateKey::$key => $name,)*
                }
            }
        }
    };
}

vocabulary! {
    Mode => "mode",
    Resolver => "resolver",
    UnitNo => "unit_no",
    RoundNo => "round_no",
    QId => "q_id",
    QType => "q_type",
    QueryDo => "query_do",
    QueryRd => "query_rd",
    QueryPayloadSent => "query_payload_sent",
    AuthPayloadDeployed => "auth_payload_deployed",
    DnstapQuerySeen => "dnstap_query_seen",
    DnstapResponseSeen => "dnstap_response_seen",
    ResponseTxtPresent => "response_txt_present",
    ResponseTimeoutReported => "response_timeout_reported",
    ResponseTcpUsed => "response_tcp_used",
    QTransport => "q_transport",
    RespId => "resp_id",
    Rcode => "rcode",
    RespTc => "resp_tc",
    Ancount => "ancount",
    Nscount => "nscount",
    Arcount => "arcount",
    RespAd => "resp_ad",
    RespDo => "resp_do",
    RespAa => "resp_aa",
    RespMalformed => "resp_malformed",
    OptPresent => "opt_present",
    Timeout => "timeout",
    DnssecPresent => "dnssec_present",
    RespSize => "resp_size",
    RespExceeds1232 => "resp_exceeds_1232",
    RespExceeds4096 => "resp_exceeds_4096",
    OutOfBailiwickCount => "out_of_bailiwick_count",
    OutOfBailiwickCached => "out_of_bailiwick_cached",
    UnsolicitedNsCount => "unsolicited_ns_count",
    UnsolicitedACount => "unsolicited_a_count",
    HasUnsolicitedNs => "has_unsolicited_ns",
    HasUnsolicitedGlue => "has_unsolicited_glue",
    InvalidAuthorityTypes => "invalid_authority_types",
    HasInvalidAuthority => "has_invalid_authority",
    CnameChaseCount => "cname_chase_count",
    CnameLoopDetected => "cname_loop_detected",
    ExcessiveCnameChase => "excessive_cname_chase",
    IdMismatch => "id_mismatch",
    NegativeCacheIndicator => "negative_cache_indicator",
    TtlZeroExposed => "ttl_zero_exposed",
    RespMinTtl => "resp_min_ttl",
    PcapUdpQuerySeen => "pcap_udp_query_seen",
    PcapTcpRetrySeen => "pcap_tcp_retry_seen",
    PcapResponseSeen => "pcap_response_seen",
    AuthNsQuerySeen => "auth_ns_query_seen",
    AuthNsResponseSeen => "auth_ns_response_seen",
    AuthTargetCorrect => "auth_target_correct",
    ForwarderQuerySeen => "forwarder_query_seen",
    UnexpectedExternalQuery => "unexpected_external_query",
    UdpQueryCount => "udp_query_count",
    TcpQueryCount => "tcp_query_count",
    ExcessiveUdpQueries => "excessive_udp_queries",
    ExcessiveTcpQueries => "excessive_tcp_queries",
    RdZeroButForwarded => "rd_zero_but_forwarded",
    MaxUpstreamRespSize => "max_upstream_resp_size",
    LargeUpstreamAccepted => "large_upstream_accepted",
    TcpFallbackSeen => "tcp_fallback_seen",
    AuthSourceExpected => "auth_source_expected",
    RespPort => "resp_port",
    RespFromUnexpectedPort => "resp_from_unexpected_port",
    LogErrorSeen => "log_error_seen",
    LogTcpFallbackDecided => "log_tcp_fallback_decided",
    LogFormerrOrNotimp => "log_formerr_or_notimp",
    CacheWritten => "cache_written",
    CacheNegPresent => "cache_neg_present",
    CacheMinTtl => "cache_min_ttl",
    AnyCacheRrsetPresent => "any_cache_rrset_present",
    CachedNsCount => "cached_ns_count",
    CachedACount => "cached_a_count",
    OutOfBailiwickInCache => "out_of_bailiwick_in_cache",
    InvalidTypesInCache => "invalid_types_in_cache",
    AnyAnsRrsetPresent => "any_ans_rrset_present",
    ServerBehavedNonidempotent => "server_behaved_nonidempotent",
    OptPaddingUnusual => "opt_padding_unusual",
    PrevNegativeTtl => "prev_negative_ttl",
    TimeSincePrev => "time_since_prev",
    RrKind => "rr_kind",
}

/// Typed value of one predicate
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PredicateValue {
    Bool(bool),
    Int(i64),
    Enum(String),
}

impl fmt::Display for PredicateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PredicateValue::Bool(b) => write!(f, "{}", b),
            PredicateValue::Int(i) => write!(f, "{}", i),
            PredicateValue::Enum(ref s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for PredicateValue {
    fn from(b: bool) -> PredicateValue {
        PredicateValue::Bool(b)
    }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(impl From<$t> for PredicateValue {
            fn from(i: $t) -> PredicateValue {
                PredicateValue::Int(i as i64)
            }
        })*
    };
}

int_value!(u16, u32, i64, usize);

impl From<&str> for PredicateValue {
    fn from(s: &str) -> PredicateValue {
        PredicateValue::Enum(s.to_string())
    }
}

/// Test mode a results tree was produced under
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Cdns,
    CdnsFallback,
    FwdGlobal,
    Recursive,
}

impl Default for Mode {
    fn default() -> Mode {
        Mode::Cdns
    }
}

impl Mode {
    /// Unknown or empty names fall back to `Cdns`.
    pub fn from_name(name: &str) -> Mode {
        match name {
            "cdns" => Mode::Cdns,
            "cdns_fallback" => Mode::CdnsFallback,
            "fwd_global" => Mode::FwdGlobal,
            "recursive" => Mode::Recursive,
            _ => Mode::Cdns,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Mode::Cdns => "CDNS",
            Mode::CdnsFallback => "CDNS_FALLBACK",
            Mode::FwdGlobal => "FWD_GLOBAL",
            Mode::Recursive => "RECURSIVE",
        }
    }

    /// Default results root of the mode, relative to the working directory
    pub fn results_dir(&self) -> &'static str {
        match *self {
            Mode::Cdns => "cdns_test_res",
            Mode::CdnsFallback => "cdns_fallback_test_res",
            Mode::FwdGlobal => "fwd_global_test_res",
            Mode::Recursive => "recursive_test_res",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabulary_order_and_uniqueness() {
        assert_eq!(PredicateKey::ALL.len(), 83);
        assert_eq!(PredicateKey::ALL[0].as_str(), "mode");
        assert_eq!(PredicateKey::ALL[82].as_str(), "rr_kind");

        let names: HashSet<&str> = PredicateKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), PredicateKey::ALL.len());
        assert!(names.iter().all(|n| !n.contains(' ')));
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(PredicateValue::from(true).to_string(), "true");
        assert_eq!(PredicateValue::from(-1i64).to_string(), "-1");
        assert_eq!(PredicateValue::from(65535u16).to_string(), "65535");
        assert_eq!(PredicateValue::from("rcNotSet").to_string(), "rcNotSet");
    }

    #[test]
    fn test_mode_normalization() {
        assert_eq!(Mode::from_name("fwd_global"), Mode::FwdGlobal);
        assert_eq!(Mode::from_name("cdns_fallback").as_str(), "CDNS_FALLBACK");
        assert_eq!(Mode::from_name(""), Mode::Cdns);
        assert_eq!(Mode::from_name("FWD_GLOBAL"), Mode::Cdns);
        assert_eq!(Mode::from_name("bogus").results_dir(), "cdns_test_res");
        assert_eq!(Mode::Recursive.results_dir(), "recursive_test_res");
    }
}
