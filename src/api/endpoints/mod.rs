//! API endpoint handlers, one module per resource.

pub mod analyses;
pub mod analyze;
pub mod chatbot;
pub mod health;
pub mod patients;
