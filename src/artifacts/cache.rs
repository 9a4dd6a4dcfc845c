//! Resolver cache dumps and logs
//!
//! Dumps come in whatever format each resolver writes, so the scan is
//! heuristic: zone-file style text is searched with a handful of patterns
//! and JSON dumps are walked looking for `ttl`, `type` and `rcode` keys.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::artifacts::read_text;
use crate::dns::analysis::Bailiwick;

pub const CACHE_DUMP_FILES: [&str; 4] = [
    "named_dump.db",
    "unbound.cache.db",
    "powerdns.cache.db",
    "cache.json",
];

pub const LOG_FILES: [&str; 6] = [
    "knot.log",
    "maradns.log",
    "bind.log",
    "unbound.log",
    "powerdns.log",
    "log.txt",
];

/// Logs whose mere presence means the resolver reported trouble
pub const ERROR_LOG_FILES: [&str; 5] = [
    "bind.log",
    "unbound.log",
    "knot.log",
    "powerdns.log",
    "log.txt",
];

const RRSET_TYPES: [&str; 7] = ["A", "AAAA", "MX", "NS", "CNAME", "TXT", "SOA"];

lazy_static! {
    static ref TTL_WORD: Regex = Regex::new(r"(?i)\bTTL\s+(\d+)").unwrap();
    static ref TTL_COLUMN: Regex = Regex::new(r"\t(\d+)\t(?:IN|CH|HS)\t").unwrap();
    static ref NEGATIVE: Regex = Regex::new(r"(?i)\bNXDOMAIN\b|\bNEGATIVE\b|\bNSEC\b").unwrap();
    static ref RRSET: Regex =
        Regex::new(r"\b(?:IN|CH|HS)\s+(?:A|AAAA|MX|NS|CNAME|TXT|SOA)\b").unwrap();
    static ref IN_NS: Regex = Regex::new(r"(?i)\bIN\s+NS\b").unwrap();
    static ref IN_ADDR: Regex = Regex::new(r"(?i)\bIN\s+(?:A|AAAA)\b").unwrap();
    static ref CACHE_ENTRY: Regex = Regex::new(r"(?i)^(\S+)\s+\d+\s+IN\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Text,
    Json,
}

/// Text of every cache dump and log found for one resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDump {
    /// At least one cache dump file exists, readable or not
    pub written: bool,
    pub log_error_seen: bool,
    pub documents: Vec<(DumpFormat, String)>,
}

/// Loads the dumps and logs in `resolver_dir`, dumps first.
pub fn load(resolver_dir: &Path) -> CacheDump {
    let mut dump = CacheDump::default();

    for name in CACHE_DUMP_FILES.iter() {
        let path = resolver_dir.join(name);
        if !path.exists() {
            continue;
        }
        dump.written = true;

        let text = log_error_continue!(read_text(&path), format!("cache dump {}", path.display()));
        let format = if name.ends_with(".json") {
            DumpFormat::Json
        } else {
            DumpFormat::Text
        };
        dump.documents.push((format, text));
    }

    for name in LOG_FILES.iter() {
        let path = resolver_dir.join(name);
        if !path.exists() {
            continue;
        }

        let text = log_error_continue!(read_text(&path), format!("resolver log {}", path.display()));
        dump.documents.push((DumpFormat::Text, text));
    }

    dump.log_error_seen = ERROR_LOG_FILES
        .iter()
        .any(|name| resolver_dir.join(name).exists());

    dump
}

/// What the cache and logs reveal about the resolver's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheScan {
    pub negative_present: bool,
    pub min_ttl: i64,
    pub any_rrset: bool,
    pub ns_count: u32,
    pub addr_count: u32,
    pub out_of_bailiwick: bool,
}

impl Default for CacheScan {
    fn default() -> CacheScan {
        CacheScan {
            negative_present: false,
            min_ttl: -1,
            any_rrset: false,
            ns_count: 0,
            addr_count: 0,
            out_of_bailiwick: false,
        }
    }
}

impl CacheScan {
    fn update_ttl(&mut self, ttl: i64) {
        self.min_ttl = if self.min_ttl < 0 {
            ttl
        } else {
            self.min_ttl.min(ttl)
        };
    }

    /// Scans zone-file style text.
    pub fn scan_text(&mut self, text: &str, zone: Option<&str>) {
        for re in [&*TTL_WORD, &*TTL_COLUMN].iter() {
            for caps in re.captures_iter(text) {
                if let Ok(ttl) = caps[1].parse::<i64>() {
                    self.update_ttl(ttl);
                }
            }
        }

        if NEGATIVE.is_match(text) {
            self.negative_present = true;
        }
        if RRSET.is_match(text) {
            self.any_rrset = true;
        }

        self.ns_count = self.ns_count.saturating_add(IN_NS.find_iter(text).count() as u32);
        self.addr_count = self
            .addr_count
            .saturating_add(IN_ADDR.find_iter(text).count() as u32);

        let zone = match zone {
            Some(zone) => zone,
            None => return,
        };
        for line in text.lines() {
            let caps = match CACHE_ENTRY.captures(line) {
                Some(caps) => caps,
                None => continue,
            };
            let name = caps[1].to_lowercase();
            let name = name.trim_end_matches('.');

            // parents of the zone are needed for delegation
            if !name.ends_with(zone) && !zone.ends_with(name) {
                self.out_of_bailiwick = true;
            }
        }
    }

    /// Scans a JSON dump, falling back to the text scan when it does not parse.
    pub fn scan_json(&mut self, text: &str, zone: Option<&str>) {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.walk_json(&value),
            Err(e) => {
                log::debug!("cache dump is not JSON ({}), scanning as text", e);
                self.scan_text(text, zone);
            }
        }
    }

    fn walk_json(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, v) in map {
                    match (key.to_lowercase().as_str(), v) {
                        ("ttl", Value::Number(n)) => {
                            let ttl = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64));
                            if let Some(ttl) = ttl {
                                self.update_ttl(ttl);
                            }
                        }
                        ("type", Value::String(s)) => {
                            let rtype = s.to_uppercase();
                            if RRSET_TYPES.contains(&rtype.as_str()) {
                                self.any_rrset = true;
                            }
                            if rtype == "NS" {
                                self.ns_count = self.ns_count.saturating_add(1);
                            }
                            if rtype == "A" || rtype == "AAAA" {
                                self.addr_count = self.addr_count.saturating_add(1);
                            }
                        }
                        ("rcode", Value::String(s)) => {
                            if s.to_uppercase() == "NXDOMAIN" {
                                self.negative_present = true;
                            }
                        }
                        _ => {}
                    }
                    self.walk_json(v);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk_json(item);
                }
            }
            _ => {}
        }
    }
}

/// Scans every document of `dump`. `query_name` decides the zone used for
/// the out-of-bailiwick check; without a two-label zone that check is off.
pub fn scan(dump: &CacheDump, query_name: &str) -> CacheScan {
    let bailiwick = Bailiwick::for_query(query_name);
    let zone = bailiwick.zone();

    let mut result = CacheScan::default();
    for (format, text) in &dump.documents {
        match format {
            DumpFormat::Text => result.scan_text(text, zone),
            DumpFormat::Json => result.scan_json(text, zone),
        }
    }

    result
}
