/// Header carrying the shared service key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the identity issued by the authentication provider.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("Invalid API key")]
    InvalidApiKey,
}

/// Validates the provided API key against the key configured at startup.
///
/// Returns `Ok(())` if the key is valid, or an error if invalid or missing.
pub fn validate_api_key(provided_key: Option<&str>, expected_key: &str) -> Result<(), AuthError> {
    let provided_key = provided_key.ok_or(AuthError::MissingHeader(API_KEY_HEADER))?;
    if !expected_key.is_empty() && provided_key == expected_key {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}
