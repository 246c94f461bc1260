//! Invite code and attendance token generation
//!
//! Invite codes are short human-typeable identifiers (8 uppercase
//! alphanumerics, a 36^8 space). Invite tokens are long unguessable UUIDs.
//! Attendance tokens are 6-digit decimal strings scoped to a single
//! participant, so they are not required to be globally unique.

use std::collections::HashSet;

use rand::Rng;
use uuid::Uuid;

use crate::utils::errors::{GatherlyError, Result};

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 8;
const MAX_ATTEMPTS: u32 = 100;

/// Generate a random invite code without checking for collisions
pub fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_CHARSET.len());
            CODE_CHARSET[idx] as char
        })
        .collect()
}

/// Generate an invite code not present in the supplied set of assigned codes
///
/// Retries on collision up to a fixed cap, then fails with
/// `CodeSpaceExhausted`.
pub fn generate_invite_code(existing: &HashSet<String>) -> Result<String> {
    for _ in 0..MAX_ATTEMPTS {
        let code = random_code();
        if !existing.contains(&code) {
            return Ok(code);
        }
    }
    Err(GatherlyError::CodeSpaceExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

/// Check invite code format: exactly 8 characters from [A-Z0-9]
pub fn is_valid_code_format(code: &str) -> bool {
    code.len() == CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Generate a long unguessable invite token
pub fn generate_invite_token() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a uniformly random 6-digit attendance token
pub fn generate_attendance_token() -> String {
    let token: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    token.to_string()
}

/// Check attendance token format: exactly 6 ASCII digits
pub fn is_valid_attendance_token(token: &str) -> bool {
    token.len() == 6 && token.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_random_code_format() {
        for _ in 0..50 {
            assert!(is_valid_code_format(&random_code()));
        }
    }

    #[test]
    fn test_code_format_rejections() {
        assert!(is_valid_code_format("ABCD1234"));
        assert!(!is_valid_code_format("ABC123"));
        assert!(!is_valid_code_format("ABCD12345"));
        assert!(!is_valid_code_format("abcd1234"));
        assert!(!is_valid_code_format("ABCD-123"));
        assert!(!is_valid_code_format(""));
    }

    #[test]
    fn test_generate_skips_existing_codes() {
        let existing: HashSet<String> = HashSet::new();
        let code = generate_invite_code(&existing).unwrap();
        assert!(is_valid_code_format(&code));

        let mut taken = HashSet::new();
        taken.insert(code.clone());
        let next = generate_invite_code(&taken).unwrap();
        assert_ne!(code, next);
    }

    #[test]
    fn test_attendance_token_format() {
        for _ in 0..50 {
            let token = generate_attendance_token();
            assert!(is_valid_attendance_token(&token));
        }
        assert!(!is_valid_attendance_token("12345"));
        assert!(!is_valid_attendance_token("1234567"));
        assert!(!is_valid_attendance_token("12a456"));
        assert!(!is_valid_attendance_token(""));
    }

    #[test]
    fn test_invite_tokens_are_unique() {
        let a = generate_invite_token();
        let b = generate_invite_token();
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn prop_valid_codes_accepted(code in "[A-Z0-9]{8}") {
            prop_assert!(is_valid_code_format(&code));
        }

        #[test]
        fn prop_wrong_length_rejected(code in "[A-Z0-9]{0,7}|[A-Z0-9]{9,12}") {
            prop_assert!(!is_valid_code_format(&code));
        }

        #[test]
        fn prop_lowercase_rejected(code in "[a-z]{8}") {
            prop_assert!(!is_valid_code_format(&code));
        }
    }
}
