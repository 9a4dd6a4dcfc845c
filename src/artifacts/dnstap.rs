//! DNSTap evidence that the resolver saw the client's query and answered it

use std::fs;
use std::path::Path;

use crate::artifacts::read_text;

const CLIENT_QUERY: &str = "\"CLIENT_QUERY\"";
const CLIENT_RESPONSE: &str = "\"CLIENT_RESPONSE\"";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DnstapEvidence {
    pub query_seen: bool,
    pub response_seen: bool,
}

impl DnstapEvidence {
    fn complete(&self) -> bool {
        self.query_seen && self.response_seen
    }

    /// Marks whatever the text of one log file shows
    pub fn scan_text(&mut self, text: &str) {
        for line in text.lines() {
            if line.contains(CLIENT_QUERY) {
                self.query_seen = true;
            }
            if line.contains(CLIENT_RESPONSE) {
                self.response_seen = true;
            }
            if self.complete() {
                return;
            }
        }
    }
}

/// Scans the JSON logs in `dir`.
///
/// When the line scan does not find both message kinds, a directory with
/// any entry at all counts as evidence of both.
pub fn scan(dir: &Path) -> DnstapEvidence {
    let mut evidence = DnstapEvidence::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return evidence,
    };

    let mut any_entry = false;
    for entry in entries {
        let entry = log_error_continue!(entry, "dnstap entry");
        any_entry = true;

        if !entry.file_name().to_string_lossy().contains(".json") {
            continue;
        }

        let text = match read_text(&entry.path()) {
            Ok(text) => text,
            Err(e) => {
                log::debug!("dnstap file skipped: {}", e);
                continue;
            }
        };
        evidence.scan_text(&text);
        if evidence.complete() {
            return evidence;
        }
    }

    if any_entry {
        evidence.query_seen = true;
        evidence.response_seen = true;
    }

    evidence
}
