use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// What a caller is allowed to do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Books and holds tickets.
    User,
    /// Publishes events and validates tickets at the door.
    Organizer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
        }
    }

    pub fn is_organizer(&self) -> bool {
        matches!(self, Role::Organizer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "organizer" => Ok(Role::Organizer),
            other => Err(format!("Role must be 'user' or 'organizer', got '{}'", other)),
        }
    }
}

/// Authenticated identity.
///
/// Passed explicitly into every booking operation; the core never looks
/// identity up on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub method: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: Role, method: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            method: method.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
