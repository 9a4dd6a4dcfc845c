//! Round orchestration
//!
//! A round lives at `<results root>/<unit>/<round>/` and holds one
//! subdirectory per resolver that took part. Each present resolver yields
//! one predicate set, sent to that resolver's monitor session.

use std::fs;
use std::path::Path;

use crate::artifacts::{self, RoundArtifacts};
use crate::capture::traffic::Resolver;
use crate::monitor::{MonitorPool, SendOutcome};
use crate::predicates::{self, Mode, PredicateSet};

/// Predicate sets for every resolver present in one round, in visiting order
pub fn collect_round(mode: Mode, unit: u32, round: u32, results_root: &Path) -> Vec<(Resolver, PredicateSet)> {
    let round_dir = artifacts::round_dir(results_root, unit, round);

    Resolver::ALL
        .iter()
        .filter(|resolver| round_dir.join(resolver.as_str()).is_dir())
        .map(|&resolver| {
            let loaded = RoundArtifacts::load(&round_dir, resolver);
            (resolver, predicates::derive(mode, unit, round, resolver, &loaded))
        })
        .collect()
}

/// Derives and streams one round. Resolvers without a directory are
/// skipped; the outcome of every send is returned.
pub fn stream_round(
    mode: Mode,
    unit: u32,
    round: u32,
    results_root: &Path,
    pool: &MonitorPool,
) -> Vec<(Resolver, SendOutcome)> {
    let sets = collect_round(mode, unit, round, results_root);
    if sets.is_empty() {
        log::debug!("unit {} round {}: no resolver output", unit, round);
    }

    sets.into_iter()
        .map(|(resolver, set)| {
            let outcome = pool.session(resolver).send(&set);
            log::trace!("unit {} round {} {}: {:?}", unit, round, resolver, outcome);
            (resolver, outcome)
        })
        .collect()
}

/// Numeric round directories present for `unit`, ascending
pub fn discover_rounds(results_root: &Path, unit: u32) -> Vec<u32> {
    let unit_dir = results_root.join(unit.to_string());
    let entries = log_error_return!(
        fs::read_dir(&unit_dir),
        format!("cannot list {}", unit_dir.display()),
        Vec::new()
    );

    let mut rounds: Vec<u32> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().and_then(|name| name.parse().ok()))
        .collect();
    rounds.sort_unstable();

    rounds
}
