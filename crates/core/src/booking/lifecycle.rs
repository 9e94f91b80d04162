use serde::Serialize;
use tracing::{error, info, warn};

use super::{BookingError, BoxOffice};
use crate::audit::{AuditEvent, CompensationAction};
use crate::auth::Identity;
use crate::metrics;
use crate::ticket::{Ticket, TicketFilter, TicketStatus, TicketWithEvent};

/// Outcome of a successful validation at the door.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationResult {
    pub ticket_id: String,
    pub holder_id: String,
    pub event_id: String,
    /// Empty if the event has since been deleted.
    pub event_title: String,
}

/// Error for a ticket already in a terminal state.
fn terminal_error(status: TicketStatus) -> Option<BookingError> {
    match status {
        TicketStatus::Active => None,
        TicketStatus::Used => Some(BookingError::AlreadyUsed),
        TicketStatus::Cancelled => Some(BookingError::Cancelled),
    }
}

impl BoxOffice {
    /// Redeem a ticket by its code, moving it from active to used.
    ///
    /// Exactly one of several concurrent validations of the same code succeeds.
    pub async fn validate_ticket(
        &self,
        validator: &Identity,
        code: &str,
    ) -> Result<ValidationResult, BookingError> {
        let result = self.redeem(validator, code).await;

        let label = match &result {
            Ok(_) => "validated",
            Err(BookingError::AlreadyUsed) => "already_used",
            Err(BookingError::Cancelled) => "cancelled",
            Err(BookingError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        metrics::VALIDATIONS_TOTAL.with_label_values(&[label]).inc();

        result
    }

    async fn redeem(
        &self,
        validator: &Identity,
        code: &str,
    ) -> Result<ValidationResult, BookingError> {
        let ticket = self.ticket_by_code(code)?;

        if let Some(err) = terminal_error(ticket.status) {
            return Err(err);
        }

        let applied = self
            .tickets
            .update_status(&ticket.id, TicketStatus::Active, TicketStatus::Used)?;
        if !applied {
            // Someone else got there between our read and the write.
            let current = self.ticket_by_code(code)?;
            return Err(terminal_error(current.status).unwrap_or(BookingError::AlreadyUsed));
        }

        let event_title = self
            .events
            .get(&ticket.event_id)?
            .map(|event| event.title)
            .unwrap_or_default();

        info!(
            ticket_id = %ticket.id,
            event_id = %ticket.event_id,
            validated_by = %validator.user_id(),
            "Ticket validated"
        );

        self.emit(AuditEvent::TicketValidated {
            ticket_id: ticket.id.clone(),
            event_id: ticket.event_id.clone(),
            holder_id: ticket.holder_id.clone(),
            validated_by: validator.user_id().to_string(),
        })
        .await;

        Ok(ValidationResult {
            ticket_id: ticket.id,
            holder_id: ticket.holder_id,
            event_id: ticket.event_id,
            event_title,
        })
    }

    /// Cancel one of the caller's own tickets and return its seat to the pool.
    pub async fn cancel_ticket(
        &self,
        caller: &Identity,
        ticket_id: &str,
    ) -> Result<Ticket, BookingError> {
        let result = self.cancel_owned(caller, ticket_id).await;

        let label = match &result {
            Ok(_) => "cancelled",
            Err(BookingError::AlreadyUsed) => "already_used",
            Err(BookingError::Cancelled) => "already_cancelled",
            Err(BookingError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        metrics::CANCELLATIONS_TOTAL.with_label_values(&[label]).inc();

        result
    }

    async fn cancel_owned(
        &self,
        caller: &Identity,
        ticket_id: &str,
    ) -> Result<Ticket, BookingError> {
        let not_found = || BookingError::NotFound("Ticket not found".to_string());

        let ticket = self
            .tickets
            .get(ticket_id)?
            .filter(|t| t.holder_id == caller.user_id())
            .ok_or_else(not_found)?;

        if let Some(err) = terminal_error(ticket.status) {
            return Err(err);
        }

        let applied =
            self.tickets
                .update_status(&ticket.id, TicketStatus::Active, TicketStatus::Cancelled)?;
        if !applied {
            let current = self.tickets.get(&ticket.id)?.ok_or_else(not_found)?;
            return Err(terminal_error(current.status).unwrap_or(BookingError::Cancelled));
        }

        match self.events.release_ticket(&ticket.event_id) {
            Ok(true) => {}
            Ok(false) => {
                // Event deleted, or already at full capacity after a resize.
                warn!(
                    event_id = %ticket.event_id,
                    ticket_id = %ticket.id,
                    "Cancelled ticket had no seat to release"
                );
            }
            Err(e) => {
                error!(
                    event_id = %ticket.event_id,
                    ticket_id = %ticket.id,
                    "Failed to release seat for cancelled ticket: {}",
                    e
                );
                metrics::COMPENSATION_FAILURES
                    .with_label_values(&["release_ticket"])
                    .inc();
                self.emit(AuditEvent::CompensationFailed {
                    action: CompensationAction::ReleaseTicket,
                    ticket_id: ticket.id.clone(),
                    event_id: ticket.event_id.clone(),
                    error: e.to_string(),
                })
                .await;
            }
        }

        info!(ticket_id = %ticket.id, event_id = %ticket.event_id, "Ticket cancelled");

        self.emit(AuditEvent::TicketCancelled {
            ticket_id: ticket.id.clone(),
            event_id: ticket.event_id.clone(),
            cancelled_by: caller.user_id().to_string(),
        })
        .await;

        self.tickets.get(&ticket.id)?.ok_or_else(not_found)
    }

    /// The caller's tickets, newest first, each with its event if it still exists.
    pub fn tickets_for_holder(
        &self,
        caller: &Identity,
    ) -> Result<Vec<TicketWithEvent>, BookingError> {
        let filter = TicketFilter::new()
            .with_holder(caller.user_id())
            .with_limit(i64::MAX);

        self.tickets
            .list(&filter)?
            .into_iter()
            .map(|ticket| -> Result<TicketWithEvent, BookingError> {
                let event = self.events.get(&ticket.event_id)?;
                Ok(TicketWithEvent { ticket, event })
            })
            .collect()
    }

    fn ticket_by_code(&self, code: &str) -> Result<Ticket, BookingError> {
        self.tickets
            .get_by_code(code)?
            .ok_or_else(|| BookingError::NotFound("Ticket not found".to_string()))
    }
}
