//! DNS message decoding for untrusted wire dumps
//!
//! `decode` is total: it never fails and never panics. Whatever could be read
//! before the first out-of-bounds access is kept, and only a buffer too small
//! to hold the 12 byte header is reported as malformed.

use std::fmt;

use derive_more::{Display, Error, From};

use crate::dns::buffer::{read_name, BufferError, NameDecodeState, NameError, PacketBuffer};
use crate::dns::query_type::QueryType;
use crate::dns::result_code::ResultCode;

#[derive(Debug, Display, From, Error)]
pub enum ProtocolError {
    Buffer(BufferError),
    Name(NameError),
}

type Result<T> = std::result::Result<T, ProtocolError>;

pub const HEADER_LEN: usize = 12;

/// Representation of a DNS header
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16, // 16 bits

    pub recursion_desired: bool,    // 1 bit
    pub truncated_message: bool,    // 1 bit
    pub authoritative_answer: bool, // 1 bit
    pub opcode: u8,                 // 4 bits
    pub response: bool,             // 1 bit

    pub rescode: ResultCode,       // 4 bits
    pub checking_disabled: bool,   // 1 bit
    pub authed_data: bool,         // 1 bit
    pub z: bool,                   // 1 bit
    pub recursion_available: bool, // 1 bit

    pub questions: u16,             // 16 bits
    pub answers: u16,               // 16 bits
    pub authoritative_entries: u16, // 16 bits
    pub resource_entries: u16,      // 16 bits
}

impl DnsHeader {
    pub fn new() -> DnsHeader {
        DnsHeader::default()
    }

    pub fn read(&mut self, buffer: &mut PacketBuffer<'_>) -> Result<()> {
        self.id = buffer.read_u16()?;

        let flags = buffer.read_u16()?;
        let a = (flags >> 8) as u8;
        let b = (flags & 0xFF) as u8;
        self.recursion_desired = (a & (1 << 0)) > 0;
        self.truncated_message = (a & (1 << 1)) > 0;
        self.authoritative_answer = (a & (1 << 2)) > 0;
        self.opcode = (a >> 3) & 0x0F;
        self.response = (a & (1 << 7)) > 0;

        self.rescode = ResultCode::from_num(b & 0x0F);
        self.checking_disabled = (b & (1 << 4)) > 0;
        self.authed_data = (b & (1 << 5)) > 0;
        self.z = (b & (1 << 6)) > 0;
        self.recursion_available = (b & (1 << 7)) > 0;

        self.questions = buffer.read_u16()?;
        self.answers = buffer.read_u16()?;
        self.authoritative_entries = buffer.read_u16()?;
        self.resource_entries = buffer.read_u16()?;

        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.answers as usize + self.authoritative_entries as usize + self.resource_entries as usize
    }
}

impl fmt::Display for DnsHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DnsHeader:")?;
        writeln!(f, "\tid: {0}", self.id)?;
        writeln!(f, "\tresponse: {0}", self.response)?;
        writeln!(f, "\trescode: {}", self.rescode)?;
        writeln!(f, "\tquestions: {0}", self.questions)?;
        writeln!(f, "\tanswers: {0}", self.answers)?;
        writeln!(f, "\tauthoritative_entries: {0}", self.authoritative_entries)?;
        writeln!(f, "\tresource_entries: {0}", self.resource_entries)?;

        Ok(())
    }
}

/// Representation of a DNS question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    pub name: String,
    pub qtype: QueryType,
}

impl DnsQuestion {
    pub fn new(name: String, qtype: QueryType) -> DnsQuestion {
        DnsQuestion { name, qtype }
    }

    pub fn read(buffer: &mut PacketBuffer<'_>, state: &mut NameDecodeState) -> Result<DnsQuestion> {
        let name = buffer.read_qname(state)?;
        let qtype = QueryType::from_num(buffer.read_u16()?);
        let _ = buffer.read_u16()?; // class

        Ok(DnsQuestion { name, qtype })
    }
}

impl Default for DnsQuestion {
    fn default() -> DnsQuestion {
        DnsQuestion::new(String::new(), QueryType::Unknown(0))
    }
}

/// Message section a record was read from
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

impl Section {
    /// Section of the record at `index` given the header counts
    fn for_index(header: &DnsHeader, index: usize) -> Section {
        let answers = header.answers as usize;
        let authorities = header.authoritative_entries as usize;

        if index < answers {
            Section::Answer
        } else if index < answers + authorities {
            Section::Authority
        } else {
            Section::Additional
        }
    }
}

/// A resource record with its RDATA left undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: QueryType,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
    /// Offset of the RDATA inside the message
    pub rdata_offset: usize,
    pub section: Section,
    /// For CNAME records with RDATA: the name read from the message at
    /// `rdata_offset`. The read uses the whole message rather than the RDATA
    /// slice, so it may follow pointers and run past RDLENGTH. Partial names
    /// from a looping or truncated read are kept as they are.
    pub cname_target: Option<String>,
}

impl ResourceRecord {
    pub fn read(
        buffer: &mut PacketBuffer<'_>,
        state: &mut NameDecodeState,
        section: Section,
    ) -> Result<ResourceRecord> {
        let name = buffer.read_qname(state)?;

        let rtype = QueryType::from_num(buffer.read_u16()?);
        let class = buffer.read_u16()?;
        let ttl = buffer.read_u32()?;
        let data_len = buffer.read_u16()?;

        let rdata_offset = buffer.pos();
        let rdata = buffer.read_range(data_len as usize)?.to_vec();

        let cname_target = if rtype == QueryType::Cname && !rdata.is_empty() {
            let target = match read_name(buffer.as_slice(), rdata_offset, state) {
                Ok((name, _)) => name,
                Err(e) => e.into_partial(),
            };
            Some(target)
        } else {
            None
        };

        Ok(ResourceRecord {
            name,
            rtype,
            class,
            ttl,
            rdata,
            rdata_offset,
            section,
            cname_target,
        })
    }

    pub fn is_opt(&self) -> bool {
        self.rtype == QueryType::Opt
    }
}

/// A decoded DNS message
#[derive(Clone, Debug, Default)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub question: DnsQuestion,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub resources: Vec<ResourceRecord>,
    /// Length of the buffer the message was decoded from
    pub size: usize,
    /// Set only when the header itself could not be read
    pub malformed: bool,
    pub opt_present: bool,
    /// DO bit from the OPT pseudo-record
    pub dnssec_ok: bool,
    pub dnssec_present: bool,
}

impl DnsMessage {
    /// The canonical result for a buffer too short to carry a header
    pub fn malformed(size: usize) -> DnsMessage {
        DnsMessage {
            size,
            malformed: true,
            ..DnsMessage::default()
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.resources.iter())
    }

    pub fn record_count(&self) -> usize {
        self.answers.len() + self.authorities.len() + self.resources.len()
    }

    /// Lowest TTL over all non-OPT records, -1 when there are none
    pub fn min_ttl(&self) -> i64 {
        self.records()
            .filter(|rec| !rec.is_opt())
            .map(|rec| rec.ttl as i64)
            .min()
            .unwrap_or(-1)
    }

    pub fn has_zero_ttl(&self) -> bool {
        self.records().any(|rec| !rec.is_opt() && rec.ttl == 0)
    }

    fn push(&mut self, rec: ResourceRecord) {
        if rec.is_opt() {
            self.opt_present = true;
            if rec.ttl & 0x8000 != 0 {
                self.dnssec_ok = true;
            }
        } else if rec.rtype.is_dnssec() {
            self.dnssec_present = true;
        }

        match rec.section {
            Section::Answer => self.answers.push(rec),
            Section::Authority => self.authorities.push(rec),
            Section::Additional => self.resources.push(rec),
        }
    }
}

/// Decodes `buf` into a `DnsMessage`.
pub fn decode(buf: &[u8]) -> DnsMessage {
    if buf.len() < HEADER_LEN {
        return DnsMessage::malformed(buf.len());
    }

    let mut buffer = PacketBuffer::new(buf);
    let mut result = DnsMessage {
        size: buf.len(),
        ..DnsMessage::default()
    };
    if let Err(e) = result.header.read(&mut buffer) {
        log::debug!("header unreadable: {}", e);
        return DnsMessage::malformed(buf.len());
    }
    log::trace!("{}", result.header);

    let mut state = NameDecodeState::new();

    for _ in 0..result.header.questions {
        match DnsQuestion::read(&mut buffer, &mut state) {
            Ok(question) => result.question = question,
            Err(e) => {
                log::debug!("question section cut short: {}", e);
                return result;
            }
        }
    }

    let header = result.header.clone();
    for index in 0..header.record_count() {
        let section = Section::for_index(&header, index);
        match ResourceRecord::read(&mut buffer, &mut state, section) {
            Ok(rec) => result.push(rec),
            Err(e) => {
                log::debug!(
                    "record iteration stopped at {}/{}: {}",
                    index,
                    header.record_count(),
                    e
                );
                break;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(id: u16, flags: u16, counts: [u16; 4]) -> Vec<u8> {
        let mut out = vec![(id >> 8) as u8, id as u8, (flags >> 8) as u8, flags as u8];
        for count in counts.iter() {
            out.push((count >> 8) as u8);
            out.push(*count as u8);
        }
        out
    }

    fn record(name: &[u8], rtype: u16, ttl: u32, rdata: &[u8]) -> Vec<u8> {
        let mut out = name.to_vec();
        out.extend_from_slice(&rtype.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&ttl.to_be_bytes());
        out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(rdata);
        out
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        let msg = decode(&[0xab, 0xcd, 0x81]);
        assert!(msg.malformed);
        assert_eq!(msg.size, 3);
        assert_eq!(msg.header.answers, 0);
        assert_eq!(msg.header.rescode, ResultCode::RcNotSet);
        assert_eq!(msg.min_ttl(), -1);
    }

    #[test]
    fn test_header_only() {
        let msg = decode(&header(0x1234, 0x8180, [0, 0, 0, 0]));
        assert!(!msg.malformed);
        assert_eq!(msg.header.id, 0x1234);
        assert!(msg.header.response);
        assert!(msg.header.recursion_desired);
        assert!(msg.header.recursion_available);
        assert_eq!(msg.header.rescode, ResultCode::NOERROR);
        assert_eq!(msg.record_count(), 0);
        assert_eq!(msg.min_ttl(), -1);
        assert!(!msg.has_zero_ttl());
    }

    #[test]
    fn test_flag_bits() {
        // qr aa tc rd | ra ad cd, rcode 2
        let msg = decode(&header(1, 0x8700 | 0x00B2, [0, 0, 0, 0]));
        assert!(msg.header.authoritative_answer);
        assert!(msg.header.truncated_message);
        assert!(msg.header.authed_data);
        assert!(msg.header.checking_disabled);
        assert_eq!(msg.header.rescode, ResultCode::SERVFAIL);
    }

    #[test]
    fn test_sections_follow_header_counts() {
        let mut data = header(7, 0x8180, [1, 1, 1, 1]);
        data.extend_from_slice(b"\x07example\x03com\x00\x00\x01\x00\x01");
        data.extend(record(&[0xc0, 12], 1, 300, &[1, 2, 3, 4]));
        data.extend(record(&[0xc0, 12], 2, 200, &[0xc0, 12]));
        data.extend(record(&[0xc0, 12], 28, 100, &[0; 16]));

        let msg = decode(&data);
        assert_eq!(msg.question.name, "example.com.");
        assert_eq!(msg.question.qtype, QueryType::A);
        assert_eq!(msg.answers.len(), 1);
        assert_eq!(msg.authorities.len(), 1);
        assert_eq!(msg.resources.len(), 1);
        assert_eq!(msg.authorities[0].rtype, QueryType::Ns);
        assert_eq!(msg.resources[0].section, Section::Additional);
        assert_eq!(msg.min_ttl(), 100);
    }

    #[test]
    fn test_truncated_record_keeps_earlier_records() {
        let mut data = header(7, 0x8180, [0, 3, 0, 0]);
        data.extend(record(b"\x00", 1, 60, &[1, 2, 3, 4]));
        let mut second = record(b"\x00", 1, 60, &[5, 6, 7, 8]);
        second.truncate(second.len() - 2);
        data.extend(second);

        let msg = decode(&data);
        assert!(!msg.malformed);
        assert_eq!(msg.header.answers, 3);
        assert_eq!(msg.answers.len(), 1);
        assert_eq!(msg.answers[0].rdata, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_opt_record_sets_edns_flags() {
        let mut data = header(7, 0x8180, [0, 0, 0, 1]);
        data.extend(record(b"\x00", 41, 0x0000_8000, &[]));

        let msg = decode(&data);
        assert!(msg.opt_present);
        assert!(msg.dnssec_ok);
        assert!(!msg.dnssec_present);
        // OPT does not count towards the TTL minimum
        assert_eq!(msg.min_ttl(), -1);
    }

    #[test]
    fn test_dnssec_record_detected() {
        let mut data = header(7, 0x8180, [0, 1, 0, 0]);
        data.extend(record(b"\x00", 46, 10, &[0; 4]));

        let msg = decode(&data);
        assert!(msg.dnssec_present);
        assert!(!msg.opt_present);
    }

    #[test]
    fn test_cname_target_read_from_message() {
        let mut data = header(7, 0x8180, [0, 1, 0, 0]);
        data.extend(record(b"\x01a\x00", 5, 60, b"\x01b\x00"));

        let msg = decode(&data);
        assert_eq!(msg.answers[0].cname_target.as_deref(), Some("b."));
    }

    #[test]
    fn test_question_loop_stops_everything() {
        let mut data = header(7, 0x8180, [1, 1, 0, 0]);
        data.extend_from_slice(&[0xc0, 12]);
        data.extend(record(b"\x00", 1, 60, &[1, 2, 3, 4]));

        let msg = decode(&data);
        assert!(!msg.malformed);
        assert_eq!(msg.question.name, "");
        assert_eq!(msg.record_count(), 0);
    }
}
