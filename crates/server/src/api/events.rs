//! Event publishing API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use boxoffice_core::{AuditEvent, CreateEventRequest, Event, EventError, UpdateEventRequest};

use super::error::{parse_id, ApiError};
use super::middleware::Organizer;
use crate::state::AppState;

/// Response for listing events
#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Owner-scoped misses don't reveal whether the event exists.
fn owned(err: EventError) -> ApiError {
    match err {
        EventError::NotFound(_) => ApiError::not_found("Event not found or unauthorized"),
        other => other.into(),
    }
}

fn changed_fields(request: &UpdateEventRequest) -> Vec<String> {
    [
        ("title", request.title.is_some()),
        ("description", request.description.is_some()),
        ("date", request.date.is_some()),
        ("location", request.location.is_some()),
        ("price", request.price.is_some()),
        ("total_tickets", request.total_tickets.is_some()),
    ]
    .into_iter()
    .filter(|(_, set)| *set)
    .map(|(name, _)| name.to_string())
    .collect()
}

/// List all events, soonest first
pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let events = state.event_store().list()?;
    Ok(Json(ListEventsResponse { events }))
}

/// Get an event by ID
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let id = parse_id(&id, "event")?;
    state
        .event_store()
        .get(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Event not found"))
}

/// Publish a new event
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Organizer(organizer): Organizer,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let Json(request) = body?;
    let event = state.event_store().create(&organizer.user_id, request)?;

    state.audit().try_emit(AuditEvent::EventPublished {
        event_id: event.id.clone(),
        organizer_id: event.organizer_id.clone(),
        title: event.title.clone(),
        total_tickets: event.total_tickets,
    });

    Ok((StatusCode::CREATED, Json(event)))
}

/// Update an event the caller owns
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Organizer(organizer): Organizer,
    Path(id): Path<String>,
    body: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
    let id = parse_id(&id, "event")?;
    let Json(request) = body?;
    let fields = changed_fields(&request);

    let event = state
        .event_store()
        .update(&id, &organizer.user_id, request)
        .map_err(owned)?;

    state.audit().try_emit(AuditEvent::EventUpdated {
        event_id: event.id.clone(),
        organizer_id: organizer.user_id.clone(),
        changed_fields: fields,
    });

    Ok(Json(event))
}

/// Delete an event the caller owns
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Organizer(organizer): Organizer,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, "event")?;
    let event = state
        .event_store()
        .delete(&id, &organizer.user_id)
        .map_err(owned)?;

    state.audit().try_emit(AuditEvent::EventDeleted {
        event_id: event.id.clone(),
        organizer_id: organizer.user_id.clone(),
        sold: event.sold(),
    });

    Ok(Json(MessageResponse {
        message: "Event deleted successfully".to_string(),
    }))
}
