//! Booking core: the inventory allocator and the ticket lifecycle.
//!
//! `BoxOffice` ties an [`EventStore`] and a [`TicketStore`] together. The two
//! stores are independent, so a booking is two writes (insert the ticket,
//! then take a seat) with a compensating delete when the second one fails.

mod allocator;
mod error;
mod lifecycle;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

pub use error::BookingError;
pub use lifecycle::ValidationResult;

use crate::audit::{AuditEvent, AuditHandle};
use crate::event::EventStore;
use crate::ticket::TicketStore;

/// Entry point for booking, validating and cancelling tickets.
pub struct BoxOffice {
    events: Arc<dyn EventStore>,
    tickets: Arc<dyn TicketStore>,
    audit: Option<AuditHandle>,
}

impl BoxOffice {
    pub fn new(events: Arc<dyn EventStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self {
            events,
            tickets,
            audit: None,
        }
    }

    /// Emit audit events for every booking, validation and cancellation.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn events(&self) -> &Arc<dyn EventStore> {
        &self.events
    }

    pub fn tickets(&self) -> &Arc<dyn TicketStore> {
        &self.tickets
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.emit(event).await;
        }
    }
}
