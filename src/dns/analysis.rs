//! Response checks for cache-poisoning and resource-exhaustion indicators
//!
//! Records are judged by the section they sit in and by plain name
//! suffixes. Delegations are not validated.

use std::collections::HashSet;

use crate::dns::protocol::{DnsMessage, ResourceRecord, Section};
use crate::dns::query_type::QueryType;

/// Zone a response is allowed to speak for, derived from the query name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bailiwick {
    zone: Option<String>,
}

impl Bailiwick {
    /// The zone is the last two labels of `query_name`. Names with fewer
    /// labels (including the empty name) accept everything.
    pub fn for_query(query_name: &str) -> Bailiwick {
        let query = normalize(query_name);
        if query.is_empty() {
            return Bailiwick { zone: None };
        }

        let parts: Vec<&str> = query.split('.').collect();
        if parts.len() < 2 {
            return Bailiwick { zone: None };
        }

        Bailiwick {
            zone: Some(parts[parts.len() - 2..].join(".")),
        }
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Plain suffix match, so `notexample.com` is inside `example.com`.
    /// The root name is outside every two-label zone.
    pub fn contains(&self, name: &str) -> bool {
        let zone = match self.zone {
            Some(ref zone) => zone,
            None => return true,
        };
        if name.is_empty() {
            return true;
        }

        let name = normalize(name);
        name == *zone || name.ends_with(zone.as_str())
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase().trim_end_matches('.').to_string()
}

/// Counters and flags derived from one decoded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFindings {
    pub out_of_bailiwick_count: u32,
    pub unsolicited_ns_count: u32,
    pub unsolicited_a_count: u32,
    pub invalid_authority_types: u32,
    pub cname_chase_count: u32,
    pub cname_loop_detected: bool,
    pub min_ttl: i64,
    pub ttl_zero: bool,
}

impl Default for MessageFindings {
    fn default() -> MessageFindings {
        MessageFindings {
            out_of_bailiwick_count: 0,
            unsolicited_ns_count: 0,
            unsolicited_a_count: 0,
            invalid_authority_types: 0,
            cname_chase_count: 0,
            cname_loop_detected: false,
            min_ttl: -1,
            ttl_zero: false,
        }
    }
}

/// Tracks CNAME sources within one message
#[derive(Debug, Default)]
struct CnameChase {
    sources: HashSet<String>,
    count: u32,
    loop_detected: bool,
}

impl CnameChase {
    fn observe(&mut self, rec: &ResourceRecord) {
        self.count += 1;

        let target = match rec.cname_target {
            Some(ref target) if !target.is_empty() => target.to_lowercase(),
            _ => return,
        };
        let owner = rec.name.to_lowercase();

        if target == owner {
            self.loop_detected = true;
        }
        if !self.sources.insert(owner) {
            self.loop_detected = true;
        }
    }
}

/// Runs every check over `msg`.
///
/// `query_name` is the name from the query artifact; when it is empty the
/// response's own question is used instead.
pub fn analyze(msg: &DnsMessage, query_name: &str) -> MessageFindings {
    let query_name = if query_name.is_empty() {
        msg.question.name.as_str()
    } else {
        query_name
    };
    let bailiwick = Bailiwick::for_query(query_name);

    let mut findings = MessageFindings {
        min_ttl: msg.min_ttl(),
        ttl_zero: msg.has_zero_ttl(),
        ..MessageFindings::default()
    };
    let mut chase = CnameChase::default();

    for rec in msg.records() {
        if rec.section != Section::Answer && !rec.is_opt() && !bailiwick.contains(&rec.name) {
            findings.out_of_bailiwick_count += 1;
        }

        match rec.section {
            Section::Authority => {
                if rec.rtype == QueryType::Ns {
                    findings.unsolicited_ns_count += 1;
                }
                if !rec.rtype.is_valid_in_authority() {
                    findings.invalid_authority_types += 1;
                }
            }
            Section::Additional => {
                if rec.rtype == QueryType::A || rec.rtype == QueryType::Aaaa {
                    findings.unsolicited_a_count += 1;
                }
            }
            Section::Answer => {}
        }

        if rec.rtype == QueryType::Cname {
            chase.observe(rec);
        }
    }

    findings.cname_chase_count = chase.count;
    findings.cname_loop_detected = chase.loop_detected;

    if findings.out_of_bailiwick_count > 0 {
        log::debug!(
            "{} records outside {:?}",
            findings.out_of_bailiwick_count,
            bailiwick.zone()
        );
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, rtype: QueryType, section: Section) -> ResourceRecord {
        ResourceRecord {
            name: name.to_string(),
            rtype,
            class: 1,
            ttl: 60,
            rdata: vec![0; 4],
            rdata_offset: 0,
            section,
            cname_target: None,
        }
    }

    fn cname(owner: &str, target: &str) -> ResourceRecord {
        ResourceRecord {
            cname_target: Some(target.to_string()),
            ..rec(owner, QueryType::Cname, Section::Answer)
        }
    }

    fn message(records: Vec<ResourceRecord>) -> DnsMessage {
        let mut msg = DnsMessage::default();
        for r in records {
            match r.section {
                Section::Answer => msg.answers.push(r),
                Section::Authority => msg.authorities.push(r),
                Section::Additional => msg.resources.push(r),
            }
        }
        msg
    }

    #[test]
    fn test_bailiwick_zone() {
        let bailiwick = Bailiwick::for_query("www.Example.com.");
        assert_eq!(bailiwick.zone(), Some("example.com"));
        assert!(bailiwick.contains("example.com."));
        assert!(bailiwick.contains("ns1.EXAMPLE.com"));
        assert!(bailiwick.contains("notexample.com."));
        assert!(!bailiwick.contains("example.net."));
        assert!(!bailiwick.contains("."));
        assert!(bailiwick.contains(""));
    }

    #[test]
    fn test_short_query_accepts_everything() {
        assert!(Bailiwick::for_query("com.").contains("evil.net."));
        assert!(Bailiwick::for_query("").contains("evil.net."));
        assert!(Bailiwick::for_query(".").contains("evil.net."));
    }

    #[test]
    fn test_out_of_bailiwick_ignores_answers_and_opt() {
        let msg = message(vec![
            rec("evil.net.", QueryType::A, Section::Answer),
            rec("evil.net.", QueryType::Ns, Section::Authority),
            rec("ns.evil.net.", QueryType::A, Section::Additional),
            rec("evil.net.", QueryType::Opt, Section::Additional),
            rec("ns.example.com.", QueryType::A, Section::Additional),
        ]);

        let findings = analyze(&msg, "www.example.com.");
        assert_eq!(findings.out_of_bailiwick_count, 2);
        assert_eq!(findings.unsolicited_ns_count, 1);
        assert_eq!(findings.unsolicited_a_count, 2);
    }

    #[test]
    fn test_falls_back_to_response_question() {
        let mut msg = message(vec![rec("evil.net.", QueryType::Ns, Section::Authority)]);
        msg.question.name = "www.example.com.".to_string();

        assert_eq!(analyze(&msg, "").out_of_bailiwick_count, 1);
        assert_eq!(analyze(&msg, "evil.net.").out_of_bailiwick_count, 0);
    }

    #[test]
    fn test_invalid_authority_types() {
        let msg = message(vec![
            rec("example.com.", QueryType::Soa, Section::Authority),
            rec("example.com.", QueryType::Nsec3Param, Section::Authority),
            rec("example.com.", QueryType::A, Section::Authority),
            rec("example.com.", QueryType::Cname, Section::Authority),
            rec("example.com.", QueryType::Txt, Section::Additional),
        ]);

        assert_eq!(analyze(&msg, "example.com.").invalid_authority_types, 2);
    }

    #[test]
    fn test_self_cname_is_a_loop() {
        let msg = message(vec![cname("a.example.com.", "A.example.com.")]);

        let findings = analyze(&msg, "");
        assert_eq!(findings.cname_chase_count, 1);
        assert!(findings.cname_loop_detected);
    }

    #[test]
    fn test_repeated_cname_source_is_a_loop() {
        let msg = message(vec![
            cname("a.example.com.", "b.example.com."),
            cname("b.example.com.", "c.example.com."),
        ]);
        assert!(!analyze(&msg, "").cname_loop_detected);

        let msg = message(vec![
            cname("a.example.com.", "b.example.com."),
            cname("a.example.com.", "c.example.com."),
        ]);
        assert!(analyze(&msg, "").cname_loop_detected);
    }

    #[test]
    fn test_cname_without_target_only_counts() {
        let mut empty = rec("a.", QueryType::Cname, Section::Answer);
        empty.rdata.clear();
        let msg = message(vec![empty.clone(), empty]);

        let findings = analyze(&msg, "");
        assert_eq!(findings.cname_chase_count, 2);
        assert!(!findings.cname_loop_detected);
    }

    #[test]
    fn test_ttl_findings() {
        let mut zero = rec("example.com.", QueryType::A, Section::Answer);
        zero.ttl = 0;
        let msg = message(vec![zero, rec("example.com.", QueryType::A, Section::Answer)]);

        let findings = analyze(&msg, "");
        assert_eq!(findings.min_ttl, 0);
        assert!(findings.ttl_zero);
        assert_eq!(analyze(&DnsMessage::default(), "").min_ttl, -1);
    }
}
