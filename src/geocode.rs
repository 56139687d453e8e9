//! Free-text label to coordinate resolution against a Nominatim-style
//! geocoding service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::Error;
use crate::model::Coordinate;

#[async_trait]
pub trait GeocodeResolver: Send + Sync {
    /// Resolves a free-text label to coordinates.
    ///
    /// A label that is empty after trimming is a no-op and resolves to
    /// `Ok(None)`: the caller keeps whatever preview it already had.
    /// Upstream failure or zero candidates is `ResolutionFailed`; callers
    /// must not block place creation on it.
    async fn resolve(&self, label: &str) -> Result<Option<Coordinate>, Error>;
}

/// The geocoding service returns coordinates as decimal strings.
#[derive(Debug, Deserialize)]
struct CandidateRow {
    lat: String,
    lon: String,
}

pub struct HttpGeocodeResolver {
    client: Client,
    base_url: String,
}

impl HttpGeocodeResolver {
    pub fn new(base_url: impl Into<String>) -> HttpGeocodeResolver {
        HttpGeocodeResolver {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GeocodeResolver for HttpGeocodeResolver {
    async fn resolve(&self, label: &str) -> Result<Option<Coordinate>, Error> {
        let query = label.trim();

        if query.is_empty() {
            return Ok(None);
        }

        let failed = |_| Error::ResolutionFailed {
            label: query.to_string(),
        };

        let rows: Vec<CandidateRow> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(failed)?
            .json()
            .await
            .map_err(failed)?;

        first_candidate(rows, query).map(Some)
    }
}

/// Deterministic "first wins": the first candidate the service returned is
/// taken, ties and alternatives are discarded.
fn first_candidate(rows: Vec<CandidateRow>, label: &str) -> Result<Coordinate, Error> {
    let failed = || Error::ResolutionFailed {
        label: label.to_string(),
    };

    let row = rows.into_iter().next().ok_or_else(failed)?;
    let latitude: f64 = row.lat.parse().map_err(|_| failed())?;
    let longitude: f64 = row.lon.parse().map_err(|_| failed())?;

    Coordinate::new(latitude, longitude).map_err(|_| failed())
}
