//! Request handlers for the HTTP endpoints

pub mod auth;

// Re-export the route builder and the bearer filter
pub use auth::{auth_routes, handle_rejection, with_auth, HandlerOptions};
