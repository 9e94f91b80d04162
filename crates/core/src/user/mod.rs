//! User accounts: registration, login and credential storage.

mod accounts;
mod password;
mod sqlite_store;
mod store;
mod types;

pub use accounts::{login, register};
pub use password::{hash_password, verify_password};
pub use sqlite_store::SqliteUserStore;
pub use store::{UserError, UserStore};
pub use types::{NewUser, RegisterRequest, User, UserProfile};
