use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::{BookingError, BoxOffice};
use crate::audit::{AuditEvent, CompensationAction};
use crate::auth::Identity;
use crate::event::Event;
use crate::metrics;
use crate::ticket::{generate_redemption_code, NewTicket, Ticket, TicketError};

/// Attempts at drawing a redemption code before giving up on collisions.
const MAX_CODE_ATTEMPTS: usize = 3;

impl BoxOffice {
    /// Book one ticket for `caller`.
    ///
    /// The ticket row is written first and the seat taken second, with a
    /// conditional decrement. If the decrement doesn't apply the ticket row is
    /// deleted again, so a failed booking leaves nothing behind.
    pub async fn book_ticket(
        &self,
        caller: &Identity,
        event_id: &str,
    ) -> Result<Ticket, BookingError> {
        let started = Instant::now();
        let result = self.allocate(caller, event_id).await;

        let label = match &result {
            Ok(_) => "booked",
            Err(BookingError::SoldOut) => "sold_out",
            Err(BookingError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        metrics::BOOKINGS_TOTAL.with_label_values(&[label]).inc();
        metrics::BOOKING_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn allocate(&self, caller: &Identity, event_id: &str) -> Result<Ticket, BookingError> {
        let event = self
            .events
            .get(event_id)?
            .ok_or_else(|| BookingError::NotFound("Event not found".to_string()))?;

        if event.is_sold_out() {
            return Err(BookingError::SoldOut);
        }

        let ticket = self.insert_ticket(caller, &event)?;

        match self.events.decrement_available(&event.id) {
            Ok(true) => {}
            Ok(false) => {
                metrics::DECREMENT_CONFLICTS.inc();
                debug!(event_id = %event.id, ticket_id = %ticket.id, "Lost the race for the last seat");
                self.undo_insert(&ticket).await;
                return Err(BookingError::SoldOut);
            }
            Err(e) => {
                error!(event_id = %event.id, ticket_id = %ticket.id, "Capacity update failed: {}", e);
                self.undo_insert(&ticket).await;
                return Err(e.into());
            }
        }

        info!(
            event_id = %event.id,
            ticket_id = %ticket.id,
            holder_id = %ticket.holder_id,
            "Ticket booked"
        );

        self.emit(AuditEvent::TicketBooked {
            ticket_id: ticket.id.clone(),
            event_id: ticket.event_id.clone(),
            holder_id: ticket.holder_id.clone(),
            price: ticket.price,
        })
        .await;

        Ok(ticket)
    }

    fn insert_ticket(&self, caller: &Identity, event: &Event) -> Result<Ticket, BookingError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let new_ticket = NewTicket {
                event_id: event.id.clone(),
                holder_id: caller.user_id().to_string(),
                code: generate_redemption_code(),
                price: event.price,
            };

            match self.tickets.insert(new_ticket) {
                Ok(ticket) => return Ok(ticket),
                Err(TicketError::DuplicateCode(code)) => {
                    warn!(attempt, code = %code, "Redemption code collision, drawing a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(BookingError::Internal(format!(
            "no unique redemption code after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    /// Delete a ticket whose seat could not be taken.
    ///
    /// Not retried. If it fails the ticket exists without a seat, which is
    /// logged, counted and audited for manual reconciliation.
    async fn undo_insert(&self, ticket: &Ticket) {
        if let Err(e) = self.tickets.delete(&ticket.id) {
            error!(
                event_id = %ticket.event_id,
                ticket_id = %ticket.id,
                "Failed to delete ticket after unsuccessful booking: {}",
                e
            );
            metrics::COMPENSATION_FAILURES
                .with_label_values(&["delete_ticket"])
                .inc();
            self.emit(AuditEvent::CompensationFailed {
                action: CompensationAction::DeleteTicket,
                ticket_id: ticket.id.clone(),
                event_id: ticket.event_id.clone(),
                error: e.to_string(),
            })
            .await;
        }
    }
}
