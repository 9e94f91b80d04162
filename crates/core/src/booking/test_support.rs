//! Store wrappers that inject failures into otherwise real SQLite stores.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use tokio::sync::mpsc;

use crate::audit::{AuditEvent, AuditEventEnvelope, AuditHandle};
use crate::auth::{Identity, Role};
use crate::event::{
    CreateEventRequest, Event, EventError, EventStore, SqliteEventStore, UpdateEventRequest,
};
use crate::ticket::{
    NewTicket, SqliteTicketStore, Ticket, TicketError, TicketFilter, TicketStatus, TicketStore,
};

pub const ORGANIZER: &str = "organizer-1";

pub fn holder(id: &str) -> Identity {
    Identity::new(id, Role::User, "jwt")
}

pub fn organizer() -> Identity {
    Identity::new(ORGANIZER, Role::Organizer, "jwt")
}

pub fn event_request(total: u32) -> CreateEventRequest {
    CreateEventRequest {
        title: "Spring Concert".to_string(),
        description: String::new(),
        date: Utc.with_ymd_and_hms(2031, 4, 12, 20, 0, 0).unwrap(),
        location: "Town Hall".to_string(),
        price: 40.0,
        total_tickets: total,
    }
}

/// An audit handle plus the receiving end, for asserting on emitted events.
pub fn audit_channel() -> (AuditHandle, mpsc::Receiver<AuditEventEnvelope>) {
    let (tx, rx) = mpsc::channel(64);
    (AuditHandle::new(tx), rx)
}

pub fn drain(rx: &mut mpsc::Receiver<AuditEventEnvelope>) -> Vec<AuditEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.event);
    }
    events
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decrement {
    Normal,
    /// Behave as if another booking took the last seat first.
    LoseRace,
    Fail,
}

pub struct FlakyEventStore {
    pub inner: SqliteEventStore,
    pub decrement: Decrement,
    pub fail_release: bool,
}

impl FlakyEventStore {
    pub fn new(decrement: Decrement) -> Self {
        Self {
            inner: SqliteEventStore::in_memory().unwrap(),
            decrement,
            fail_release: false,
        }
    }
}

impl EventStore for FlakyEventStore {
    fn create(&self, organizer_id: &str, request: CreateEventRequest) -> Result<Event, EventError> {
        self.inner.create(organizer_id, request)
    }

    fn get(&self, id: &str) -> Result<Option<Event>, EventError> {
        self.inner.get(id)
    }

    fn list(&self) -> Result<Vec<Event>, EventError> {
        self.inner.list()
    }

    fn update(
        &self,
        id: &str,
        organizer_id: &str,
        request: UpdateEventRequest,
    ) -> Result<Event, EventError> {
        self.inner.update(id, organizer_id, request)
    }

    fn delete(&self, id: &str, organizer_id: &str) -> Result<Event, EventError> {
        self.inner.delete(id, organizer_id)
    }

    fn decrement_available(&self, id: &str) -> Result<bool, EventError> {
        match self.decrement {
            Decrement::Normal => self.inner.decrement_available(id),
            Decrement::LoseRace => Ok(false),
            Decrement::Fail => Err(EventError::Database("database is locked".to_string())),
        }
    }

    fn release_ticket(&self, id: &str) -> Result<bool, EventError> {
        if self.fail_release {
            return Err(EventError::Database("disk I/O error".to_string()));
        }
        self.inner.release_ticket(id)
    }
}

pub struct FlakyTicketStore {
    pub inner: SqliteTicketStore,
    pub fail_delete: AtomicBool,
    /// Number of upcoming inserts to reject as code collisions.
    pub collisions: AtomicUsize,
    pub inserts: AtomicUsize,
}

impl FlakyTicketStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteTicketStore::in_memory().unwrap(),
            fail_delete: AtomicBool::new(false),
            collisions: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
        }
    }
}

impl TicketStore for FlakyTicketStore {
    fn insert(&self, ticket: NewTicket) -> Result<Ticket, TicketError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let collide = self
            .collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if collide {
            return Err(TicketError::DuplicateCode(ticket.code));
        }
        self.inner.insert(ticket)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        self.inner.get(id)
    }

    fn get_by_code(&self, code: &str) -> Result<Option<Ticket>, TicketError> {
        self.inner.get_by_code(code)
    }

    fn delete(&self, id: &str) -> Result<(), TicketError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(TicketError::Database("disk I/O error".to_string()));
        }
        self.inner.delete(id)
    }

    fn update_status(
        &self,
        id: &str,
        from: TicketStatus,
        to: TicketStatus,
    ) -> Result<bool, TicketError> {
        self.inner.update_status(id, from, to)
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        self.inner.list(filter)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        self.inner.count(filter)
    }
}
