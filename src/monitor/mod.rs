//! Streaming predicates to the external runtime-verification monitor
//!
//! # Module Structure
//!
//! * `line` - The line protocol
//! * `session` - One supervised monitor process
//! * `pool` - Sessions keyed by resolver

pub mod line;

pub mod session;

pub mod pool;

pub use self::pool::MonitorPool;
pub use self::session::{MonitorSession, SendOutcome};
