//! Behavioral predicates derived from one fuzzing round
//!
//! # Module Structure
//!
//! * `vocabulary` - Predicate keys, values and test modes
//! * `set` - The typed predicate record
//! * `policy` - Thresholds for the derived booleans
//! * `derive` - Building a record from loaded artifacts

pub mod vocabulary;

pub mod set;

pub mod policy;

pub mod derive;

pub use self::derive::derive;
pub use self::set::PredicateSet;
pub use self::vocabulary::{Mode, PredicateKey, PredicateValue};
