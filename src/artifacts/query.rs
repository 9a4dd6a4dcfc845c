//! The query the fuzzer sent, stored as a single hex line

use std::path::Path;

use crate::artifacts::{read_trimmed, ArtifactError};
use crate::dns::buffer::{NameDecodeState, PacketBuffer};
use crate::dns::protocol::{self, DnsHeader, HEADER_LEN};
use crate::dns::query_type::QueryType;

/// Fields of the fuzzer's query that feed the predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInfo {
    pub id: u16,
    pub qtype: QueryType,
    pub dnssec_ok: bool,
    pub recursion_desired: bool,
    /// Name of the first question, possibly partial; used only for
    /// bailiwick checks
    pub name: String,
}

impl Default for QueryInfo {
    fn default() -> QueryInfo {
        QueryInfo {
            id: 0,
            qtype: QueryType::Unknown(0),
            dnssec_ok: false,
            recursion_desired: true,
            name: String::new(),
        }
    }
}

impl QueryInfo {
    /// Extracts the query fields from wire bytes. Anything shorter than a
    /// header gives the defaults.
    pub fn parse(raw: &[u8]) -> QueryInfo {
        let mut info = QueryInfo::default();
        if raw.len() < HEADER_LEN {
            return info;
        }

        let mut buffer = PacketBuffer::new(raw);
        let mut header = DnsHeader::new();
        if header.read(&mut buffer).is_err() {
            return info;
        }

        info.id = header.id;
        info.recursion_desired = header.recursion_desired;
        info.dnssec_ok = protocol::decode(raw).dnssec_ok;

        if header.questions < 1 {
            return info;
        }

        let mut state = NameDecodeState::new();
        match buffer.read_qname(&mut state) {
            Ok(name) => info.name = name,
            Err(e) => {
                info.name = e.into_partial();
                return info;
            }
        }

        if buffer.remaining() >= 4 {
            if let Ok(qtype) = buffer.read_u16() {
                info.qtype = QueryType::from_num(qtype);
            }
        }

        info
    }

    /// Parses the hex text of a query file.
    pub fn from_hex(text: &str) -> Result<QueryInfo, ArtifactError> {
        let raw = hex::decode(text.trim()).map_err(|e| ArtifactError::Encoding {
            reason: e.to_string(),
        })?;

        Ok(QueryInfo::parse(&raw))
    }
}

/// Loads `query.txt`.
pub fn load(path: &Path) -> Result<QueryInfo, ArtifactError> {
    let text = read_trimmed(path)?;
    QueryInfo::from_hex(&text)
}
