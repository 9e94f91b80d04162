use std::sync::Arc;

use boxoffice_core::{
    AuditHandle, AuditStore, Authenticator, BoxOffice, Config, EventStore, JwtAuthenticator,
    SanitizedConfig, TicketStore, UserStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<JwtAuthenticator>,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
    users: Arc<dyn UserStore>,
    box_office: BoxOffice,
}

impl AppState {
    /// Event and ticket stores are reached through `box_office`.
    pub fn new(
        config: Config,
        authenticator: Arc<JwtAuthenticator>,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        users: Arc<dyn UserStore>,
        box_office: BoxOffice,
    ) -> Self {
        Self {
            config,
            authenticator,
            audit,
            audit_store,
            users,
            box_office,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Token issuer for login and registration.
    pub fn tokens(&self) -> &JwtAuthenticator {
        self.authenticator.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn user_store(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn event_store(&self) -> &dyn EventStore {
        self.box_office.events().as_ref()
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.box_office.tickets().as_ref()
    }

    pub fn box_office(&self) -> &BoxOffice {
        &self.box_office
    }
}
