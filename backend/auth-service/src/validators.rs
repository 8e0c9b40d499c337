use once_cell::sync::Lazy;
use regex::Regex;

/// Input validation utilities for the auth service

// Compiled once at first use; the pattern is a hardcoded constant.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

/// Validate email format (RFC 5322 simplified).
///
/// Syntax only; no DNS or deliverability checks.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Result of evaluating the password policy.
///
/// All three predicates are reported independently so the caller can name
/// the first failing rule in its error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    pub meets_min_length: bool,
    pub has_letter: bool,
    pub has_digit: bool,
}

impl PasswordStrength {
    pub fn is_acceptable(&self) -> bool {
        self.meets_min_length && self.has_letter && self.has_digit
    }
}

/// Evaluate password strength requirements
/// - Minimum 8 characters
/// - At least one letter
/// - At least one digit
pub fn check_password_strength(password: &str) -> PasswordStrength {
    PasswordStrength {
        meets_min_length: password.len() >= 8,
        has_letter: password.chars().any(|c| c.is_alphabetic()),
        has_digit: password.chars().any(|c| c.is_ascii_digit()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user+tag@sub.example.co.uk"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example.c"));
    }

    #[test]
    fn test_short_password_fails_min_length_regardless_of_content() {
        for password in ["", "a1", "abc123", "abcd12!"] {
            assert!(!check_password_strength(password).meets_min_length);
        }
    }

    #[test]
    fn test_acceptable_password() {
        let strength = check_password_strength("pass1234");
        assert!(strength.meets_min_length);
        assert!(strength.has_letter);
        assert!(strength.has_digit);
        assert!(strength.is_acceptable());
    }

    #[test]
    fn test_each_rule_reported_independently() {
        let no_digit = check_password_strength("passwords");
        assert!(no_digit.meets_min_length);
        assert!(no_digit.has_letter);
        assert!(!no_digit.has_digit);

        let no_letter = check_password_strength("12345678");
        assert!(no_letter.meets_min_length);
        assert!(!no_letter.has_letter);
        assert!(no_letter.has_digit);
    }
}
