use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::error::Error;
use crate::model::{format_rfc3339, Visit};

#[async_trait]
pub trait VisitLedger: Send + Sync {
    /// Records one visit. Best-effort: a failure is reported so the caller
    /// can log it, but it must never block rendering of the browsed page.
    async fn record(&self, visit: &Visit) -> Result<(), Error>;

    /// Returns the owner's visit history in backend order. Zero visits is
    /// an empty sequence, not an error.
    async fn fetch_history(&self, owner: &str) -> Result<Vec<Visit>, Error>;
}

pub struct HttpVisitLedger {
    client: Client,
    base_url: String,
}

impl HttpVisitLedger {
    pub fn new(base_url: impl Into<String>) -> HttpVisitLedger {
        HttpVisitLedger {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl VisitLedger for HttpVisitLedger {
    async fn record(&self, visit: &Visit) -> Result<(), Error> {
        let form = Form::new()
            .text("owner", visit.owner.clone())
            .text("visitor", visit.visitor.clone())
            .text("token", visit.token.clone())
            .text("occurredAt", format_rfc3339(visit.occurred_at));

        self.client
            .post(format!("{}/places/visits", self.base_url))
            .multipart(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::RecordFailed(e.to_string()))?;

        Ok(())
    }

    async fn fetch_history(&self, owner: &str) -> Result<Vec<Visit>, Error> {
        let body: Value = self
            .client
            .get(format!("{}/places/{owner}/visits", self.base_url))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        Ok(demote_malformed(body, owner))
    }
}

/// A malformed ledger response degrades to an empty history rather than
/// taking the whole view down.
fn demote_malformed(body: Value, owner: &str) -> Vec<Visit> {
    match parse_history(body) {
        Ok(visits) => visits,
        Err(error) => {
            warn!(owner, %error, "visit history malformed, treating as empty");
            Vec::new()
        }
    }
}

fn parse_history(body: Value) -> Result<Vec<Visit>, Error> {
    let Value::Array(rows) = body else {
        return Err(Error::MalformedHistory);
    };

    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|_| Error::MalformedHistory))
        .collect()
}
