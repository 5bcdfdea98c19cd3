//! HTTP API.
//!
//! Exposes patient records, lab tests, analysis reports, the liver panel
//! classifier and the chatbot as JSON endpoints under `/api/`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ServerError, ServerSession};
pub use types::ApiContext;
