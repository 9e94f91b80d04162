use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EventError;

/// A published event with ticket capacity.
///
/// Invariant: `available_tickets <= total_tickets`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub price: f64,
    pub total_tickets: u32,
    pub available_tickets: u32,
    pub organizer_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Tickets currently held (active or used).
    pub fn sold(&self) -> u32 {
        self.total_tickets.saturating_sub(self.available_tickets)
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_tickets == 0
    }
}

/// Request to publish a new event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub price: f64,
    pub total_tickets: u32,
}

impl CreateEventRequest {
    pub fn validate(&self) -> Result<(), EventError> {
        if self.title.trim().is_empty() {
            return Err(EventError::InvalidInput("title is required".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(EventError::InvalidInput("location is required".to_string()));
        }
        validate_price(self.price)?;
        if self.total_tickets == 0 {
            return Err(EventError::InvalidInput(
                "total_tickets must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update; only the fields that are set change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub total_tickets: Option<u32>,
}

impl UpdateEventRequest {
    pub fn validate(&self) -> Result<(), EventError> {
        if matches!(self.title.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(EventError::InvalidInput("title cannot be empty".to_string()));
        }
        if matches!(self.location.as_deref(), Some(l) if l.trim().is_empty()) {
            return Err(EventError::InvalidInput(
                "location cannot be empty".to_string(),
            ));
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if self.total_tickets == Some(0) {
            return Err(EventError::InvalidInput(
                "total_tickets must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.price.is_none()
            && self.total_tickets.is_none()
    }
}

fn validate_price(price: f64) -> Result<(), EventError> {
    if !price.is_finite() || price < 0.0 {
        return Err(EventError::InvalidInput(
            "price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}
