use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Degraded,
    Down,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "up",
            Status::Degraded => "degraded",
            Status::Down => "down",
        }
    }
}

/// One website to probe, as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTarget {
    pub website_id: Uuid,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub region: String,
    /// A missing or `null` list is an empty batch.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub urls: Vec<CheckTarget>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<CheckTarget>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<CheckTarget>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of a single probe. Exactly one is produced per [`CheckTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub website_id: Uuid,
    pub url: String,
    pub status: Status,
    /// HTTP status received, 0 when no response arrived.
    pub status_code: u16,
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,
}

impl CheckResult {
    pub fn down(target: &CheckTarget, response_time_ms: u64) -> Self {
        Self {
            website_id: target.website_id,
            url: target.url.clone(),
            status: Status::Down,
            status_code: 0,
            response_time_ms,
        }
    }
}
