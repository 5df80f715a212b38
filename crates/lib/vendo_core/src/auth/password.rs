//! Password policy enforcement and hashing via bcrypt.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Characters counted as symbols by `require_symbol`, space included.
const SYMBOLS: &str = r##" !"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Password composition policy.
///
/// Length bounds count characters, not bytes. Each enabled flag requires at
/// least one character of that class. `validate` reports every unmet
/// criterion at once rather than stopping at the first.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_lower: bool,
    pub require_upper: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 5,
            max_length: 60,
            require_lower: true,
            require_upper: true,
            require_digit: true,
            require_symbol: true,
        }
    }
}

impl PasswordPolicy {
    /// Check a raw password against the policy, accumulating violations.
    pub fn validate(&self, password: &str) -> Result<(), AuthError> {
        let mut violations = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            violations.push(format!("must be at least {} characters", self.min_length));
        }
        if length > self.max_length {
            violations.push(format!("must be at most {} characters", self.max_length));
        }
        if self.require_lower && !password.chars().any(char::is_lowercase) {
            violations.push("must contain a lowercase letter".to_string());
        }
        if self.require_upper && !password.chars().any(char::is_uppercase) {
            violations.push("must contain an uppercase letter".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push("must contain a digit".to_string());
        }
        if self.require_symbol && !password.chars().any(|c| SYMBOLS.contains(c)) {
            violations.push("must contain a symbol".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AuthError::PolicyViolation(violations))
        }
    }
}

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// Empty passwords and empty hashes never match; malformed hashes count as
/// a mismatch rather than an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if password.is_empty() || hash.is_empty() {
        return false;
    }
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violations(result: Result<(), AuthError>) -> Vec<String> {
        match result {
            Err(AuthError::PolicyViolation(v)) => v,
            other => panic!("expected policy violations, got {other:?}"),
        }
    }

    #[test]
    fn short_password_reports_length() {
        let v = violations(PasswordPolicy::default().validate("abc"));
        assert!(v.iter().any(|m| m.contains("at least 5")), "got {v:?}");
    }

    #[test]
    fn violations_accumulate_instead_of_short_circuiting() {
        // Too short, no uppercase, no digit, no symbol: four at once.
        let v = violations(PasswordPolicy::default().validate("abc"));
        assert_eq!(v.len(), 4, "got {v:?}");
    }

    #[test]
    fn compliant_password_passes() {
        assert!(PasswordPolicy::default().validate("Abc123!@").is_ok());
    }

    #[test]
    fn space_counts_as_a_symbol() {
        assert!(PasswordPolicy::default().validate("Abc 123").is_ok());
    }

    #[test]
    fn overlong_password_reports_max_length() {
        let v = violations(PasswordPolicy::default().validate(&"Aa1!".repeat(20)));
        assert!(v.iter().any(|m| m.contains("at most 60")), "got {v:?}");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Five two-byte characters plus the required classes.
        let policy = PasswordPolicy {
            require_upper: false,
            require_digit: false,
            require_symbol: false,
            ..PasswordPolicy::default()
        };
        assert!(policy.validate("ééééé").is_ok());
    }

    #[test]
    fn disabled_flags_are_not_enforced() {
        let policy = PasswordPolicy {
            require_lower: false,
            require_upper: false,
            require_digit: false,
            require_symbol: false,
            ..PasswordPolicy::default()
        };
        assert!(policy.validate("AAAAA").is_ok());
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("Abc123!@").unwrap();
        assert!(verify_password("Abc123!@", &hash));
        assert!(!verify_password("Abc123!#", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Abc123!@").unwrap();
        let b = hash_password("Abc123!@").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_inputs_never_match() {
        let hash = hash_password("Abc123!@").unwrap();
        assert!(!verify_password("", &hash));
        assert!(!verify_password("Abc123!@", ""));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("Abc123!@", "not-a-bcrypt-hash"));
    }
}
