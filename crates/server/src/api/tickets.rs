//! Ticket API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use boxoffice_core::{Ticket, TicketWithEvent};

use super::error::{parse_id, ApiError};
use super::middleware::{AuthUser, Organizer};
use crate::state::AppState;

/// Request body for validating a ticket at the door
#[derive(Debug, Deserialize)]
pub struct ValidateTicketBody {
    #[serde(alias = "qrCode")]
    pub qr_code: String,
}

/// Response for listing the caller's tickets
#[derive(Debug, Serialize)]
pub struct MyTicketsResponse {
    pub tickets: Vec<TicketWithEvent>,
}

#[derive(Debug, Serialize)]
pub struct ValidatedTicket {
    pub id: String,
    /// Event title
    pub event: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateTicketResponse {
    pub message: String,
    pub ticket: ValidatedTicket,
}

/// Book one ticket for the caller
pub async fn book_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(event_id): Path<String>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let event_id = parse_id(&event_id, "event")?;
    let ticket = state.box_office().book_ticket(&caller, &event_id).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// The caller's tickets with their events
pub async fn my_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<MyTicketsResponse>, ApiError> {
    let tickets = state.box_office().tickets_for_holder(&caller)?;
    Ok(Json(MyTicketsResponse { tickets }))
}

/// Redeem a ticket code. Organizers only.
pub async fn validate_ticket(
    State(state): State<Arc<AppState>>,
    Organizer(validator): Organizer,
    body: Result<Json<ValidateTicketBody>, JsonRejection>,
) -> Result<Json<ValidateTicketResponse>, ApiError> {
    let Json(body) = body?;
    let code = body.qr_code.trim();
    if code.is_empty() {
        return Err(ApiError::bad_request("QR code is required"));
    }

    let result = state.box_office().validate_ticket(&validator, code).await?;

    Ok(Json(ValidateTicketResponse {
        message: "Ticket validated successfully".to_string(),
        ticket: ValidatedTicket {
            id: result.ticket_id,
            event: result.event_title,
            user_id: result.holder_id,
        },
    }))
}

/// Cancel one of the caller's tickets
pub async fn cancel_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    let id = parse_id(&id, "ticket")?;
    let ticket = state.box_office().cancel_ticket(&caller, &id).await?;
    Ok(Json(ticket))
}
