//! Error handling helpers shared by the artifact readers
//!
//! A missing or unreadable artifact never aborts a round: the affected
//! predicates fall back to their defaults. These helpers keep that pattern
//! uniform and logged.

/// Log an error and continue with the next loop iteration
#[macro_export]
macro_rules! log_error_continue {
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => {
                log::warn!("{}: {}", $msg, e);
                continue;
            }
        }
    };
}

/// Log an error and return from function
#[macro_export]
macro_rules! log_error_return {
    ($result:expr, $msg:expr, $ret:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => {
                log::warn!("{}: {}", $msg, e);
                return $ret;
            }
        }
    };
}

/// Unwraps `result`, falling back to the type's default when it failed
pub fn default_with_logging<T: Default, E: std::fmt::Display>(
    result: Result<T, E>,
    context: &str,
) -> T {
    match result {
        Ok(val) => val,
        Err(e) => {
            log::debug!("{} unavailable, using defaults: {}", context, e);
            T::default()
        }
    }
}
