//! Event catalogue: publishing events and tracking their ticket capacity.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteEventStore;
pub use store::{EventError, EventStore};
pub use types::{CreateEventRequest, Event, UpdateEventRequest};
