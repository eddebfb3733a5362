use super::types::{FieldError, UsernamePasswordInput};

pub const USERNAME_TOO_SHORT: &str = "username is too short, length of 3 or more";
pub const PASSWORD_TOO_SHORT: &str = "password is too short, length of 4 or more";

const MIN_USERNAME_LENGTH: usize = 3;
const MIN_PASSWORD_LENGTH: usize = 4;

/// Checks the shape of registration credentials.
///
/// Reports at most one error: the username rule is checked first and wins.
/// Lengths are counted in UTF-16 code units, so a character outside the Basic
/// Multilingual Plane counts twice. Nothing is trimmed or normalized.
pub fn validate(input: &UsernamePasswordInput) -> Vec<FieldError> {
    if utf16_len(&input.username) < MIN_USERNAME_LENGTH {
        return vec![FieldError::new("username", USERNAME_TOO_SHORT)];
    }

    if utf16_len(&input.password) < MIN_PASSWORD_LENGTH {
        return vec![FieldError::new("password", PASSWORD_TOO_SHORT)];
    }

    Vec::new()
}

fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}
