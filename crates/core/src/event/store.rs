use thiserror::Error;

use super::{CreateEventRequest, Event, UpdateEventRequest};

#[derive(Debug, Error)]
pub enum EventError {
    /// Event absent, or not owned by the caller.
    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Cannot resize event {event_id} to {requested} tickets: {sold} already sold")]
    CapacityBelowSold {
        event_id: String,
        sold: u32,
        requested: u32,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Trait for event storage backends.
///
/// Capacity mutations are conditional single statements so concurrent
/// bookings can never drive `available_tickets` below zero or above the total.
pub trait EventStore: Send + Sync {
    /// Publish a new event owned by `organizer_id`, with all tickets available.
    fn create(&self, organizer_id: &str, request: CreateEventRequest) -> Result<Event, EventError>;

    fn get(&self, id: &str) -> Result<Option<Event>, EventError>;

    /// All events, soonest first.
    fn list(&self) -> Result<Vec<Event>, EventError>;

    /// Apply a partial update to an event owned by `organizer_id`.
    ///
    /// A capacity change keeps the sold count fixed:
    /// `available_new = total_new - (total_old - available_old)`.
    /// Shrinking below the sold count fails with `CapacityBelowSold`.
    fn update(
        &self,
        id: &str,
        organizer_id: &str,
        request: UpdateEventRequest,
    ) -> Result<Event, EventError>;

    /// Delete an event owned by `organizer_id`, returning it.
    fn delete(&self, id: &str, organizer_id: &str) -> Result<Event, EventError>;

    /// Take one ticket out of the pool if any remain.
    ///
    /// Returns `true` iff the counter was decremented.
    fn decrement_available(&self, id: &str) -> Result<bool, EventError>;

    /// Put one ticket back into the pool, never exceeding the total.
    ///
    /// Returns `true` iff the counter was incremented.
    fn release_ticket(&self, id: &str) -> Result<bool, EventError>;
}
