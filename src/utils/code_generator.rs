//! Short code generation and validation utilities.
//!
//! Generated and custom codes share the URL-safe base64 alphabet
//! (`A-Z a-z 0-9 - _`), so every code is a single path segment.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Length of a generated short code.
pub const GENERATED_CODE_LEN: usize = 6;

/// Random bytes drawn per code. 6 bytes encode to 8 characters, which are
/// truncated to [`GENERATED_CODE_LEN`].
const CODE_LENGTH_BYTES: usize = 6;

const CUSTOM_CODE_MIN: usize = 3;
const CUSTOM_CODE_MAX: usize = 32;

/// Route words that a custom code must not shadow. `overall` and `recent`
/// would be unreachable under `/api/stats/{code}`.
const RESERVED_CODES: &[&str] = &["api", "health", "stats", "overall", "recent"];

/// Generates a random 6-character short code.
///
/// Uses `getrandom` for entropy and encodes the result as URL-safe base64
/// without padding.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
pub fn generate_code() -> Result<String, AppError> {
    let mut buffer = [0u8; CODE_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;

    let mut code = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer);
    code.truncate(GENERATED_CODE_LEN);
    Ok(code)
}

/// Returns true if every character is in the URL-safe base64 alphabet.
pub fn is_url_safe(code: &str) -> bool {
    code.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - Length: 3-32 characters
/// - Allowed characters: `A-Z a-z 0-9 - _`
/// - Cannot be a reserved route word
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    let len = code.chars().count();
    if !(CUSTOM_CODE_MIN..=CUSTOM_CODE_MAX).contains(&len) {
        return Err(AppError::bad_request(
            "Custom code must be 3-32 characters",
            json!({ "provided_length": len }),
        ));
    }

    if !is_url_safe(code) {
        return Err(AppError::bad_request(
            "Custom code can only contain letters, digits, hyphens and underscores",
            json!({ "code": code }),
        ));
    }

    if RESERVED_CODES.contains(&code.to_ascii_lowercase().as_str()) {
        return Err(AppError::bad_request(
            "This code is reserved",
            json!({ "code": code }),
        ));
    }

    Ok(())
}
