use thiserror::Error;

use crate::event::EventError;
use crate::ticket::TicketError;

/// Failure of a booking-core operation.
///
/// Display strings are safe to show to API clients, except `Internal`,
/// whose payload is for logs only.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    NotFound(String),

    #[error("No tickets available")]
    SoldOut,

    #[error("Ticket already used")]
    AlreadyUsed,

    #[error("Ticket is cancelled")]
    Cancelled,

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EventError> for BookingError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotFound(_) => BookingError::NotFound("Event not found".to_string()),
            EventError::CapacityBelowSold { .. } => BookingError::Conflict(err.to_string()),
            EventError::InvalidInput(_) | EventError::Database(_) => {
                BookingError::Internal(err.to_string())
            }
        }
    }
}

impl From<TicketError> for BookingError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::NotFound(_) => BookingError::NotFound("Ticket not found".to_string()),
            TicketError::DuplicateCode(_) | TicketError::Database(_) => {
                BookingError::Internal(err.to_string())
            }
        }
    }
}
