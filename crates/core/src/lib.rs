pub mod audit;
pub mod auth;
pub mod booking;
pub mod config;
mod db;
pub mod event;
pub mod metrics;
pub mod ticket;
pub mod user;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, CompensationAction, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, JwtAuthenticator, Role,
};
pub use booking::{BookingError, BoxOffice, ValidationResult};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, Config, ConfigError,
    DatabaseConfig, SanitizedConfig, ServerConfig,
};
pub use event::{
    CreateEventRequest, Event, EventError, EventStore, SqliteEventStore, UpdateEventRequest,
};
pub use ticket::{
    SqliteTicketStore, Ticket, TicketError, TicketFilter, TicketStatus, TicketStore,
    TicketWithEvent,
};
pub use user::{RegisterRequest, SqliteUserStore, User, UserError, UserProfile, UserStore};
