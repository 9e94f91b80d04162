use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repair step that did not complete after a failed or reversed booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompensationAction {
    /// Deleting a ticket whose capacity decrement did not apply.
    DeleteTicket,
    /// Returning a cancelled ticket's seat to the pool.
    ReleaseTicket,
}

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Accounts
    UserRegistered {
        user_id: String,
        email: String,
        role: String,
    },

    // Event catalogue
    EventPublished {
        event_id: String,
        organizer_id: String,
        title: String,
        total_tickets: u32,
    },
    EventUpdated {
        event_id: String,
        organizer_id: String,
        /// Names of the fields the update touched.
        changed_fields: Vec<String>,
    },
    EventDeleted {
        event_id: String,
        organizer_id: String,
        /// Tickets that were sold when the event was removed.
        sold: u32,
    },

    // Ticket lifecycle
    TicketBooked {
        ticket_id: String,
        event_id: String,
        holder_id: String,
        price: f64,
    },
    TicketValidated {
        ticket_id: String,
        event_id: String,
        holder_id: String,
        validated_by: String,
    },
    TicketCancelled {
        ticket_id: String,
        event_id: String,
        cancelled_by: String,
    },

    /// A compensating write failed and inventory may be off by one.
    ///
    /// Operators should reconcile `available_tickets` for the event by hand.
    CompensationFailed {
        action: CompensationAction,
        ticket_id: String,
        event_id: String,
        error: String,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::UserRegistered { .. } => "user_registered",
            Self::EventPublished { .. } => "event_published",
            Self::EventUpdated { .. } => "event_updated",
            Self::EventDeleted { .. } => "event_deleted",
            Self::TicketBooked { .. } => "ticket_booked",
            Self::TicketValidated { .. } => "ticket_validated",
            Self::TicketCancelled { .. } => "ticket_cancelled",
            Self::CompensationFailed { .. } => "compensation_failed",
        }
    }

    /// Extract the catalogue event id, if this audit entry concerns one
    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::EventPublished { event_id, .. }
            | Self::EventUpdated { event_id, .. }
            | Self::EventDeleted { event_id, .. }
            | Self::TicketBooked { event_id, .. }
            | Self::TicketValidated { event_id, .. }
            | Self::TicketCancelled { event_id, .. }
            | Self::CompensationFailed { event_id, .. } => Some(event_id),
            _ => None,
        }
    }

    /// Extract ticket_id if this event is ticket-related
    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            Self::TicketBooked { ticket_id, .. }
            | Self::TicketValidated { ticket_id, .. }
            | Self::TicketCancelled { ticket_id, .. }
            | Self::CompensationFailed { ticket_id, .. } => Some(ticket_id),
            _ => None,
        }
    }

    /// Extract user_id if this event was triggered by a user action
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::UserRegistered { user_id, .. } => Some(user_id),
            Self::EventPublished { organizer_id, .. }
            | Self::EventUpdated { organizer_id, .. }
            | Self::EventDeleted { organizer_id, .. } => Some(organizer_id),
            Self::TicketBooked { holder_id, .. } => Some(holder_id),
            Self::TicketValidated { validated_by, .. } => Some(validated_by),
            Self::TicketCancelled { cancelled_by, .. } => Some(cancelled_by),
            _ => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub event_id: Option<String>,
    pub ticket_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}

impl AuditRecord {
    /// Build an unsaved record (id 0) with the index columns pulled from the event.
    pub fn from_event(timestamp: DateTime<Utc>, event: AuditEvent) -> Self {
        Self {
            id: 0,
            timestamp,
            event_type: event.event_type().to_string(),
            event_id: event.event_id().map(String::from),
            ticket_id: event.ticket_id().map(String::from),
            user_id: event.user_id().map(String::from),
            data: event,
        }
    }
}
