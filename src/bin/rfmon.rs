use std::env;
use std::path::PathBuf;
use std::process;

use getopts::{Matches, Options};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use rfmon::config::BridgeConfig;
use rfmon::monitor::line;
use rfmon::monitor::{MonitorPool, SendOutcome};
use rfmon::predicates::Mode;
use rfmon::round;

fn print_usage(program: &str, opts: Options) {
    let brief = format!("Usage: {} [options] -u UNIT", program);
    print!("{}", opts.usage(&brief));
}

/// Parses `7` or `3-9` (inclusive).
fn parse_rounds(text: &str) -> Option<(u32, u32)> {
    let mut bounds = text.splitn(2, '-');
    let first = bounds.next()?.trim().parse().ok()?;
    let last = match bounds.next() {
        Some(last) => last.trim().parse().ok()?,
        None => first,
    };

    if first <= last {
        Some((first, last))
    } else {
        None
    }
}

fn build_config(matches: &Matches) -> BridgeConfig {
    let mut config = match matches.opt_str("c") {
        Some(path) => match BridgeConfig::load(&PathBuf::from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load configuration {}: {}", path, e);
                process::exit(1);
            }
        },
        None => BridgeConfig::default(),
    };

    if let Some(root) = matches.opt_str("d") {
        config.results_root = Some(PathBuf::from(root));
    }
    if let Some(bin) = matches.opt_str("monitor-bin") {
        config.monitor_bin = PathBuf::from(bin);
    }
    if let Some(spec) = matches.opt_str("monitor-spec") {
        config.monitor_spec = PathBuf::from(spec);
    }
    if let Some(dir) = matches.opt_str("log-dir") {
        config.log_dir = PathBuf::from(dir);
    }

    config
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optflag("h", "help", "print this help menu");
    opts.optopt(
        "m",
        "mode",
        "Test mode: cdns, cdns_fallback, fwd_global or recursive",
        "MODE",
    );
    opts.optopt("u", "unit", "Test unit number", "UNIT");
    opts.optopt(
        "r",
        "rounds",
        "Round or inclusive round range (e.g. 4 or 1-20); all rounds by default",
        "RANGE",
    );
    opts.optopt("c", "config", "TOML configuration file", "FILE");
    opts.optopt(
        "d",
        "results-root",
        "Results tree to read instead of the mode's default",
        "DIRECTORY",
    );
    opts.optopt("", "monitor-bin", "Monitor executable", "PATH");
    opts.optopt("", "monitor-spec", "Formula file passed to the monitor", "PATH");
    opts.optopt("", "log-dir", "Directory for monitor output logs", "DIRECTORY");
    opts.optflag(
        "n",
        "dry-run",
        "Print predicate lines instead of streaming them",
    );
    opts.optflag("v", "verbose", "Log at debug level");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            print_usage(&program, opts);
            process::exit(2);
        }
    };

    if matches.opt_present("h") {
        print_usage(&program, opts);
        return;
    }

    let level = if matches.opt_present("v") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let unit = match matches.opt_str("u").map(|u| u.parse::<u32>()) {
        Some(Ok(unit)) => unit,
        Some(Err(e)) => {
            log::error!("Invalid unit number: {}", e);
            process::exit(2);
        }
        None => {
            print_usage(&program, opts);
            process::exit(2);
        }
    };

    let mode = Mode::from_name(&matches.opt_str("m").unwrap_or_default());
    let config = build_config(&matches);
    let results_root = config.results_root_for(mode);

    let rounds: Vec<u32> = match matches.opt_str("r") {
        Some(text) => match parse_rounds(&text) {
            Some((first, last)) => (first..=last).collect(),
            None => {
                log::error!("Invalid round range: {}", text);
                process::exit(2);
            }
        },
        None => round::discover_rounds(&results_root, unit),
    };

    log::info!(
        "{} unit {}: {} round(s) from {}",
        mode,
        unit,
        rounds.len(),
        results_root.display()
    );

    if matches.opt_present("n") {
        for round_no in rounds {
            for (_, set) in round::collect_round(mode, unit, round_no, &results_root) {
                println!("{}", line::serialize(&set));
            }
        }
        return;
    }

    let pool = MonitorPool::new(config);
    let mut not_delivered = 0;
    for round_no in rounds {
        for (resolver, outcome) in round::stream_round(mode, unit, round_no, &results_root, &pool) {
            match outcome {
                SendOutcome::Delivered | SendOutcome::DeliveredAfterRestart => {}
                SendOutcome::Skipped | SendOutcome::Dropped => {
                    log::debug!("round {} {}: {:?}", round_no, resolver, outcome);
                    not_delivered += 1;
                }
            }
        }
    }

    pool.end_all_sessions();
    pool.terminate_all();

    if not_delivered > 0 {
        log::warn!("{} predicate line(s) were not delivered", not_delivered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rounds() {
        assert_eq!(parse_rounds("4"), Some((4, 4)));
        assert_eq!(parse_rounds("1-20"), Some((1, 20)));
        assert_eq!(parse_rounds(" 2 - 3 "), Some((2, 3)));
        assert_eq!(parse_rounds("9-3"), None);
        assert_eq!(parse_rounds("x"), None);
        assert_eq!(parse_rounds("1-"), None);
    }
}
