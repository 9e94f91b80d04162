mod jwt;
mod traits;
mod types;

pub use jwt::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create the token authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<JwtAuthenticator, AuthError> {
    JwtAuthenticator::new(&config.jwt_secret, config.token_ttl_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_authenticator() {
        let config = AuthConfig {
            jwt_secret: "secret-key".to_string(),
            token_ttl_secs: 60,
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "jwt");
    }

    #[test]
    fn test_create_authenticator_missing_secret() {
        let config = AuthConfig {
            jwt_secret: String::new(),
            token_ttl_secs: 60,
        };
        let result = create_authenticator(&config);
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }
}
