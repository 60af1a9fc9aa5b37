#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing x-api-key header")]
    Missing,
    #[error("invalid API key")]
    Invalid,
}

/// Validates the provided API key against the configured one.
///
/// When no key is configured every caller is accepted.
///
/// # Errors
///
/// Returns `AuthError::Missing` if a key is configured but none was provided, or
/// `AuthError::Invalid` if the keys differ.
pub fn validate_api_key(provided_key: Option<&str>, expected_key: Option<&str>) -> Result<(), AuthError> {
    let Some(expected_key) = expected_key else {
        return Ok(());
    };
    match provided_key {
        None => Err(AuthError::Missing),
        Some(key) if key == expected_key => Ok(()),
        Some(_) => Err(AuthError::Invalid),
    }
}
