use tracing::{debug, info};

use super::{hash_password, verify_password, NewUser, RegisterRequest, User, UserError, UserStore};

const MIN_PASSWORD_LEN: usize = 6;

/// Validate and persist a new account.
pub fn register(store: &dyn UserStore, request: RegisterRequest) -> Result<User, UserError> {
    let name = request.name.trim();
    let email = request.email.trim();

    if name.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(UserError::InvalidInput("All fields are required".to_string()));
    }
    if !email.contains('@') {
        return Err(UserError::InvalidInput("Email address is not valid".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::InvalidInput(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    // Cheap early exit; the UNIQUE constraint still decides races.
    if store.get_by_email(email)?.is_some() {
        return Err(UserError::EmailTaken(email.to_string()));
    }

    let user = store.create(NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(&request.password)?,
        role: request.role,
    })?;

    info!(user_id = %user.id, role = %user.role, "Registered user");
    Ok(user)
}

/// Check credentials. Unknown email and wrong password are indistinguishable.
pub fn login(store: &dyn UserStore, email: &str, password: &str) -> Result<User, UserError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(UserError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    let Some(user) = store.get_by_email(email)? else {
        debug!("Login attempt for unknown email");
        return Err(UserError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(UserError::InvalidCredentials);
    }

    Ok(user)
}
