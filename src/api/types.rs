//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::core_state::CoreState;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Accept a patient identifier sent either as a JSON string or a number.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Int(n)) => Some(n.to_string()),
        None => None,
    })
}
