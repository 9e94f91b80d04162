use thiserror::Error;

use super::{NewUser, User};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User with email {0} already exists")]
    EmailTaken(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Trait for user storage backends.
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with `EmailTaken` if the email is already registered.
    fn create(&self, user: NewUser) -> Result<User, UserError>;

    fn get(&self, id: &str) -> Result<Option<User>, UserError>;

    fn get_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
}
