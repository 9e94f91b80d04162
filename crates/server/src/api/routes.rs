use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::{auth_middleware, metrics_middleware};
use super::{audit, events, handlers, tickets, users};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        // Health, metrics and config
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/config", get(handlers::get_config))
        // Accounts
        .route("/auth/register", post(users::register))
        .route("/auth/login", post(users::login))
        // Browsing
        .route("/events", get(events::list_events))
        .route("/events/{id}", get(events::get_event));

    let protected_routes = Router::new()
        // Publishing
        .route("/events", post(events::create_event))
        .route(
            "/events/{id}",
            put(events::update_event).delete(events::delete_event),
        )
        // Tickets
        .route("/tickets/book/{event_id}", post(tickets::book_ticket))
        .route("/tickets/my", get(tickets::my_tickets))
        .route("/tickets/validate", post(tickets::validate_ticket))
        .route("/tickets/{id}/cancel", post(tickets::cancel_ticket))
        // Audit
        .route("/audit", get(audit::query_audit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
