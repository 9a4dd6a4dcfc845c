//! Text protocol spoken to the monitor over its stdin

use crate::predicates::{PredicateSet, PredicateValue};

/// Tells the monitor that the current trace is complete
pub const END_SESSION: &str = "__END_SESSION__";

fn token(value: &PredicateValue) -> String {
    value.to_string().replace(' ', "_")
}

/// Renders `set` as space separated `key=value` tokens in vocabulary order,
/// without the trailing newline.
pub fn serialize(set: &PredicateSet) -> String {
    let tokens: Vec<String> = set
        .iter()
        .map(|(key, value)| format!("{}={}", key.as_str(), token(&value)))
        .collect();

    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaces_become_underscores() {
        assert_eq!(token(&PredicateValue::from("NO ERROR here")), "NO_ERROR_here");
        assert_eq!(token(&PredicateValue::from(false)), "false");
    }
}
