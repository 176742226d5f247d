//! Identifier rules shared by table, column and database names.

/// Longest identifier every supported engine accepts (`MySQL` caps at 64).
pub const MAX_IDENTIFIER_LEN: usize = 64;

const IDENTIFIER_SHAPE: &str = concat!(
    "must start with a letter or underscore ",
    "and contain only letters, digits and underscores"
);

/// `^[A-Za-z_][A-Za-z0-9_]*$`
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Violation message for `value`, if it is not a usable identifier.
#[must_use]
pub fn identifier_violation(value: &str) -> Option<String> {
    if value.is_empty() {
        Some("must not be empty".to_owned())
    } else if !is_identifier(value) {
        Some(IDENTIFIER_SHAPE.to_owned())
    } else if value.len() > MAX_IDENTIFIER_LEN {
        Some(format!("must not be longer than {MAX_IDENTIFIER_LEN} characters"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_shape() {
        for ok in ["widgets", "_tmp", "Order2", "a"] {
            assert!(is_identifier(ok), "{ok}");
        }
        for bad in ["", "2fast", "drop table", "name-with-dash", "wid;gets", "caf\u{e9}"] {
            assert!(!is_identifier(bad), "{bad}");
        }
    }

    #[test]
    fn violation_reports_length() {
        assert!(identifier_violation("widgets").is_none());
        let long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(identifier_violation(&long).unwrap().contains("64"));
        assert!(identifier_violation("").is_some());
    }
}
