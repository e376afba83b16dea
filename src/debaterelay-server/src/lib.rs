//! DebateRelay HTTP server.
//!
//! Exposes the debate turn pipeline over HTTP for browser clients.

pub mod api;
pub mod error;
pub mod state;

pub use api::create_router;
pub use error::ApiError;
pub use state::AppState;
