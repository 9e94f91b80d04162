pub mod audit;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod tickets;
pub mod users;

pub use routes::create_router;
