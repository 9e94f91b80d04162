//! Common test utilities for E2E testing.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by a temporary SQLite database, so requests run through the real
//! router, middleware and stores.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use boxoffice_core::{
    create_audit_system, AuditFilter, AuditRecord, AuditStore, AuthConfig, BoxOffice, Config,
    DatabaseConfig, JwtAuthenticator, ServerConfig, SqliteAuditStore, SqliteEventStore,
    SqliteTicketStore, SqliteUserStore,
};

pub const JWT_SECRET: &str = "e2e-test-secret";

/// Test fixture for E2E testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_publish() {
///     let fixture = TestFixture::new().await;
///     let organizer = fixture.register_organizer("org@example.com").await;
///
///     let response = fixture.post_as(&organizer, "/events", event_body(10)).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Audit store, for checking what the writer persisted
    pub audit_store: Arc<dyn AuditStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A registered account and its bearer token
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub token: String,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
                token_ttl_secs: 3600,
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
        };

        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );
        let users = Arc::new(SqliteUserStore::new(&db_path).expect("Failed to create user store"));
        let events =
            Arc::new(SqliteEventStore::new(&db_path).expect("Failed to create event store"));
        let tickets =
            Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"));

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let box_office = BoxOffice::new(events, tickets).with_audit(audit_handle.clone());

        let state = Arc::new(boxoffice_server::state::AppState::new(
            config,
            Arc::new(JwtAuthenticator::new(JWT_SECRET, 3600).expect("Failed to create authenticator")),
            audit_handle,
            Arc::clone(&audit_store),
            users,
            box_office,
        ));

        let router = boxoffice_server::api::create_router(state);

        Self {
            router,
            audit_store,
            temp_dir,
        }
    }

    /// Register a ticket buyer.
    pub async fn register_user(&self, email: &str) -> Account {
        self.register(email, "user").await
    }

    /// Register an event organizer.
    pub async fn register_organizer(&self, email: &str) -> Account {
        self.register(email, "organizer").await
    }

    async fn register(&self, email: &str, role: &str) -> Account {
        let response = self
            .post(
                "/auth/register",
                json!({
                    "name": "Test Account",
                    "email": email,
                    "password": "password123",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "registration failed: {}",
            response.body
        );

        Account {
            id: response.body["user"]["id"].as_str().unwrap().to_string(),
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Publish an event and return its id.
    pub async fn publish_event(&self, organizer: &Account, total_tickets: u32) -> String {
        let response = self
            .post_as(organizer, "/events", event_body(total_tickets))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Book a ticket and return the response body.
    pub async fn book(&self, buyer: &Account, event_id: &str) -> TestResponse {
        self.post_as(buyer, &format!("/tickets/book/{}", event_id), Value::Null)
            .await
    }

    /// Poll the audit store until `event_type` has been written `count` times.
    pub async fn wait_for_audit(&self, event_type: &str, count: usize) -> Vec<AuditRecord> {
        let filter = AuditFilter::new().with_event_type(event_type);
        for _ in 0..100 {
            let records = self.audit_store.query(&filter).expect("audit query failed");
            if records.len() >= count {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} x {}", count, event_type);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send an authenticated GET request.
    pub async fn get_as(&self, account: &Account, path: &str) -> TestResponse {
        self.request("GET", path, None, Some(&account.token)).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    /// Send an authenticated POST request. A `Null` body sends no body.
    pub async fn post_as(&self, account: &Account, path: &str, body: Value) -> TestResponse {
        let body = (!body.is_null()).then_some(body);
        self.request("POST", path, body, Some(&account.token)).await
    }

    /// Send an authenticated PUT request with JSON body.
    pub async fn put_as(&self, account: &Account, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body), Some(&account.token))
            .await
    }

    /// Send an authenticated DELETE request.
    pub async fn delete_as(&self, account: &Account, path: &str) -> TestResponse {
        self.request("DELETE", path, None, Some(&account.token))
            .await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            request_builder =
                request_builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// A valid event body with the given capacity.
pub fn event_body(total_tickets: u32) -> Value {
    json!({
        "title": "Harbour Lights Festival",
        "description": "Three stages by the water",
        "date": "2030-07-14T18:00:00Z",
        "location": "Pier 4",
        "price": 45.0,
        "total_tickets": total_tickets,
    })
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
