//! API module for the Sentiscope HTTP server

pub mod routes;
pub mod server;

pub use routes::{ApiError, AppState};
pub use server::{ApiServer, ApiServerConfig};
