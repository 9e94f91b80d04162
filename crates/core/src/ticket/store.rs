//! Ticket storage trait and types.

use std::fmt;

use super::{NewTicket, Ticket, TicketStatus};

/// Error type for ticket operations.
#[derive(Debug)]
pub enum TicketError {
    /// Ticket not found.
    NotFound(String),
    /// Another ticket already carries this redemption code.
    DuplicateCode(String),
    /// Database error.
    Database(String),
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketError::NotFound(id) => write!(f, "Ticket not found: {}", id),
            TicketError::DuplicateCode(code) => {
                write!(f, "Redemption code already in use: {}", code)
            }
            TicketError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for TicketError {}

/// Filter for querying tickets.
#[derive(Debug, Clone)]
pub struct TicketFilter {
    pub event_id: Option<String>,
    pub holder_id: Option<String>,
    pub status: Option<TicketStatus>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketFilter {
    pub fn new() -> Self {
        Self {
            event_id: None,
            holder_id: None,
            status: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_event(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_holder(mut self, holder_id: impl Into<String>) -> Self {
        self.holder_id = Some(holder_id.into());
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// Persist a new `Active` ticket. Fails with `DuplicateCode` on a code collision.
    fn insert(&self, ticket: NewTicket) -> Result<Ticket, TicketError>;

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    fn get_by_code(&self, code: &str) -> Result<Option<Ticket>, TicketError>;

    /// Permanently delete a ticket. Only used to undo a booking.
    fn delete(&self, id: &str) -> Result<(), TicketError>;

    /// Move a ticket from `from` to `to`, only if it is still in `from`.
    ///
    /// Returns `true` iff the transition was applied.
    fn update_status(
        &self,
        id: &str,
        from: TicketStatus,
        to: TicketStatus,
    ) -> Result<bool, TicketError>;

    /// List tickets matching the filter, newest first.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;
}
