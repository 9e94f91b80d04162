use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - JWT secret is not empty
/// - Token TTL is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.jwt_secret.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "auth.jwt_secret must be set".to_string(),
        ));
    }

    if config.auth.token_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "auth.token_ttl_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
