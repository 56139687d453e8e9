use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One browse of an owner's places by a visitor. Recorded once per browse
/// activation; never mutated or deleted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub owner: String,
    pub visitor: String,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    /// Opaque correlation value, may be empty.
    #[serde(default)]
    pub token: String,
}

impl Visit {
    pub fn now(owner: impl Into<String>, visitor: impl Into<String>) -> Visit {
        Visit {
            owner: owner.into(),
            visitor: visitor.into(),
            occurred_at: OffsetDateTime::now_utc(),
            token: String::new(),
        }
    }
}
