//! Wire types for the inbound answer API.

use serde::{Deserialize, Serialize};

/// Response body for `POST /api/` - one answer string, no metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

impl AnswerResponse {
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: answer.into() }
    }
}

/// Service description returned from `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub usage: String,
}
