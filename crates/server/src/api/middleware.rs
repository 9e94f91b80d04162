//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use boxoffice_core::{AuthError, AuthRequest, Identity, Role};

use super::error::ApiError;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Authentication middleware for protected routes.
///
/// Verifies the bearer token and stores the caller's `Identity` in the
/// request extensions. Missing or bad tokens are rejected with 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    let source_ip = request
        .extensions()
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };

    match state.authenticator().authenticate(&auth_request).await {
        Ok(identity) => {
            let mut request = request;
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(AuthError::NotAuthenticated) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["not_authenticated"]).inc();
            Err(ApiError::new(StatusCode::UNAUTHORIZED, "Authentication required"))
        }
        Err(AuthError::InvalidCredentials(_)) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["invalid_credentials"]).inc();
            Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid token"))
        }
        Err(e) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["internal_error"]).inc();
            Err(ApiError::internal(e))
        }
    }
}

/// Extractor for the authenticated caller.
///
/// Rejects with 401 if the auth middleware did not run for this route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Authentication required"))
    }
}

/// Extractor for an authenticated organizer. Other roles get 403.
#[derive(Debug, Clone)]
pub struct Organizer(pub Identity);

impl<S> FromRequestParts<S> for Organizer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        if identity.role != Role::Organizer {
            AUTH_FAILURES_TOTAL.with_label_values(&["forbidden"]).inc();
            return Err(ApiError::new(
                StatusCode::FORBIDDEN,
                "Access denied. Organizer role required",
            ));
        }
        Ok(Organizer(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        middleware,
        routing::get,
        Router,
    };
    use boxoffice_core::{
        create_audit_system, AuditStore, BoxOffice, Config, JwtAuthenticator, SqliteAuditStore,
        SqliteEventStore, SqliteTicketStore, SqliteUserStore, UserStore,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "middleware-test-secret";

    fn create_test_state() -> Arc<AppState> {
        let config: Config = boxoffice_core::load_config_from_str(&format!(
            "[auth]\njwt_secret = \"{}\"\n",
            SECRET
        ))
        .unwrap();

        let authenticator = Arc::new(JwtAuthenticator::new(SECRET, 3600).unwrap());
        let audit_store = Arc::new(SqliteAuditStore::in_memory().unwrap()) as Arc<dyn AuditStore>;
        let (audit_handle, _writer) = create_audit_system(audit_store.clone(), 100);
        let users = Arc::new(SqliteUserStore::in_memory().unwrap()) as Arc<dyn UserStore>;
        let box_office = BoxOffice::new(
            Arc::new(SqliteEventStore::in_memory().unwrap()),
            Arc::new(SqliteTicketStore::in_memory().unwrap()),
        );

        Arc::new(AppState::new(
            config,
            authenticator,
            audit_handle,
            audit_store,
            users,
            box_office,
        ))
    }

    async fn whoami(AuthUser(identity): AuthUser) -> String {
        identity.user_id
    }

    async fn organizer_only(Organizer(identity): Organizer) -> String {
        identity.user_id
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/organizer", get(organizer_only))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn bearer(state: &AppState, user_id: &str, role: Role) -> String {
        format!("Bearer {}", state.tokens().issue_token(user_id, role).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token_sets_identity() {
        let state = create_test_state();
        let auth = bearer(&state, "user-1", Role::User);

        let request = Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), "user-1");
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let state = create_test_state();

        let request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let state = create_test_state();

        let request = Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_rejected() {
        let state = create_test_state();
        let other = JwtAuthenticator::new("some-other-secret", 3600).unwrap();
        let token = other.issue_token("user-1", Role::Organizer).unwrap();

        let request = Request::builder()
            .uri("/organizer")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_forbidden_on_organizer_route() {
        let state = create_test_state();
        let auth = bearer(&state, "user-1", Role::User);

        let request = Request::builder()
            .uri("/organizer")
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_organizer_allowed_on_organizer_route() {
        let state = create_test_state();
        let auth = bearer(&state, "org-1", Role::Organizer);

        let request = Request::builder()
            .uri("/organizer")
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_extractor_without_middleware_is_unauthorized() {
        let state = create_test_state();
        let app = Router::new().route("/whoami", get(whoami)).with_state(state);

        let request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
