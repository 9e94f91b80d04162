//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Lifecycle status of a ticket.
///
/// `Active` moves to `Used` (validation) or `Cancelled` (holder cancellation).
/// Both of those are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Active,
    Used,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Used => "used",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Used | TicketStatus::Cancelled)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TicketStatus::Active),
            "used" => Ok(TicketStatus::Used),
            "cancelled" => Ok(TicketStatus::Cancelled),
            other => Err(format!("unknown ticket status: {}", other)),
        }
    }
}

/// A booked ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: String,
    pub event_id: String,
    pub holder_id: String,
    /// Redemption code presented at the door (encoded in the QR image).
    pub code: String,
    pub status: TicketStatus,
    /// Event price at the moment of purchase.
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to persist a fresh ticket. New tickets always start `Active`.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub event_id: String,
    pub holder_id: String,
    pub code: String,
    pub price: f64,
}

/// A ticket together with the event it admits to.
///
/// `event` is `None` when the event has since been deleted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TicketWithEvent {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub event: Option<Event>,
}

/// Generate a redemption code: `TKT-<unix_secs>-<32 hex chars>`.
///
/// The hex part is 128 bits from the thread-local CSPRNG.
pub fn generate_redemption_code() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("TKT-{}-{}", Utc::now().timestamp(), const_hex::encode(bytes))
}
