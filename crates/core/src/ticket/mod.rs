//! Tickets: one unit of admission to an event, redeemable exactly once.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketFilter, TicketStore};
pub use types::{generate_redemption_code, NewTicket, Ticket, TicketStatus, TicketWithEvent};
