use crate::models::planet::deserialize_required_id;
use serde::{Deserialize, Serialize};

/// Body of `POST /planet`. `{"id": 3.0}` looks up planet 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetLookupRequest {
    #[serde(deserialize_with = "deserialize_required_id")]
    pub id: i64,
}

/// Body of `GET /os`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfoResponse {
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

/// Body of the `/live` and `/ready` probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub status: String,
}

impl ProbeResponse {
    pub fn live() -> Self {
        Self {
            status: "live".to_string(),
        }
    }

    pub fn ready() -> Self {
        Self {
            status: "ready".to_string(),
        }
    }
}
