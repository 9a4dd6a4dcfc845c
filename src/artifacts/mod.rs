//! Loading of the files a fuzzing round leaves behind
//!
//! Each round directory looks like
//!
//! ```text
//! <unit>/<round>/query.txt
//! <unit>/<round>/auth_payload.txt
//! <unit>/<round>/dnstap/...
//! <unit>/<round>/<resolver>/response.txt
//! <unit>/<round>/<resolver>/tcpdump.pcap
//! <unit>/<round>/<resolver>/<cache dumps and logs>
//! ```
//!
//! Loaders only do I/O and decoding of the file encodings. Every artifact
//! has an explicit absent form, so nothing here fails a round.
//!
//! # Module Structure
//!
//! * `query` - The fuzzer's query
//! * `response` - The resolver's answer to the client
//! * `dnstap` - DNSTap log evidence
//! * `cache` - Cache dumps and resolver logs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};

use crate::capture::traffic::Resolver;

/// Query file parsing
pub mod query;

/// Response file decoding
pub mod response;

/// DNSTap directory scanning
pub mod dnstap;

/// Cache dump and log scanning
pub mod cache;

pub use self::cache::CacheDump;
pub use self::dnstap::DnstapEvidence;
pub use self::query::QueryInfo;
pub use self::response::ResponseArtifact;

pub const QUERY_FILE: &str = "query.txt";
pub const AUTH_PAYLOAD_FILE: &str = "auth_payload.txt";
pub const DNSTAP_DIR: &str = "dnstap";
pub const RESPONSE_FILE: &str = "response.txt";
pub const CAPTURE_FILE: &str = "tcpdump.pcap";

/// Captures shorter than this hold no packet record
pub const MIN_CAPTURE_LEN: u64 = 25;

#[derive(Debug, Display, From, Error)]
pub enum ArtifactError {
    #[display(fmt = "{} does not exist", "path.display()")]
    #[from(ignore)]
    Missing { path: PathBuf },
    #[display(fmt = "{} is empty", "path.display()")]
    #[from(ignore)]
    Empty { path: PathBuf },
    Io(io::Error),
    #[display(fmt = "undecodable contents: {}", reason)]
    #[from(ignore)]
    Encoding { reason: String },
}

impl ArtifactError {
    /// Missing and empty files are the normal case for many rounds
    pub fn is_absent(&self) -> bool {
        matches!(
            *self,
            ArtifactError::Missing { .. } | ArtifactError::Empty { .. }
        )
    }
}

type Result<T> = std::result::Result<T, ArtifactError>;

fn open_error(path: &Path, e: io::Error) -> ArtifactError {
    if e.kind() == io::ErrorKind::NotFound {
        ArtifactError::Missing {
            path: path.to_path_buf(),
        }
    } else {
        ArtifactError::Io(e)
    }
}

/// Reads `path` as text, dropping bytes that are not valid UTF-8.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| open_error(path, e))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            let lossy = String::from_utf8_lossy(e.as_bytes()).replace('\u{FFFD}', "");
            Ok(lossy)
        }
    }
}

/// Like `read_text`, but with surrounding whitespace removed and an empty
/// result reported as `ArtifactError::Empty`.
pub fn read_trimmed(path: &Path) -> Result<String> {
    let text = read_text(path)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ArtifactError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(trimmed.to_string())
}

/// Reads a packet capture, treating one too short to hold a record as empty.
pub fn read_capture(path: &Path) -> Result<Vec<u8>> {
    let meta = fs::metadata(path).map_err(|e| open_error(path, e))?;
    if meta.len() < MIN_CAPTURE_LEN {
        return Err(ArtifactError::Empty {
            path: path.to_path_buf(),
        });
    }

    fs::read(path).map_err(|e| open_error(path, e))
}

/// Directory of one (unit, round) pair below a results root
pub fn round_dir(results_root: &Path, unit: u32, round: u32) -> PathBuf {
    results_root.join(unit.to_string()).join(round.to_string())
}

/// Everything one resolver left behind in one round
#[derive(Debug, Clone)]
pub struct RoundArtifacts {
    pub query: QueryInfo,
    pub query_file_present: bool,
    pub auth_payload_present: bool,
    pub dnstap: DnstapEvidence,
    pub response: ResponseArtifact,
    /// Raw capture bytes, `None` when absent or too short
    pub capture: Option<Vec<u8>>,
    pub cache: CacheDump,
}

impl RoundArtifacts {
    pub fn load(round_dir: &Path, resolver: Resolver) -> RoundArtifacts {
        let resolver_dir = round_dir.join(resolver.as_str());

        let query_path = round_dir.join(QUERY_FILE);
        let query = crate::error_utils::default_with_logging(
            query::load(&query_path),
            "query file",
        );

        let capture = match read_capture(&resolver_dir.join(CAPTURE_FILE)) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                if !e.is_absent() {
                    log::warn!("capture for {} unreadable: {}", resolver, e);
                }
                None
            }
        };

        RoundArtifacts {
            query,
            query_file_present: query_path.exists(),
            auth_payload_present: round_dir.join(AUTH_PAYLOAD_FILE).exists(),
            dnstap: dnstap::scan(&round_dir.join(DNSTAP_DIR)),
            response: response::load(&resolver_dir.join(RESPONSE_FILE)),
            capture,
            cache: cache::load(&resolver_dir),
        }
    }
}
