use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::Error;

/// A validated latitude/longitude pair. Fields are private so the range
/// invariant cannot be bypassed; construction goes through [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Coordinate, Error> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidCoordinate {
                axis: "latitude",
                value: latitude,
            });
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate {
                axis: "longitude",
                value: longitude,
            });
        }

        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A stored place record. Append-only: the backend assigns `id` on
/// creation and the client never updates or deletes a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub owner: String,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// An image captured alongside a draft, sent as a multipart file part.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A not-yet-submitted place. Coordinates and date stay optional until
/// submit time so partially filled forms can be carried across failures.
#[derive(Debug, Clone)]
pub struct PlaceDraft {
    pub owner: String,
    pub label: String,
    pub coordinate: Option<Coordinate>,
    pub occurred_at: Option<OffsetDateTime>,
    pub image: Option<ImageAttachment>,
}

impl PlaceDraft {
    /// Local completeness check, run before any network call. Returns the
    /// mandatory resolved fields so callers need no second destructure.
    pub fn complete(&self) -> Result<(Coordinate, OffsetDateTime), Error> {
        if self.owner.trim().is_empty() {
            return Err(Error::IncompletePlace("owner"));
        }

        if self.label.trim().is_empty() {
            return Err(Error::IncompletePlace("label"));
        }

        let coordinate = self.coordinate.ok_or(Error::IncompletePlace("coordinates"))?;
        let occurred_at = self.occurred_at.ok_or(Error::IncompletePlace("occurredAt"))?;

        Ok((coordinate, occurred_at))
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.complete().map(|_| ())
    }
}

/// RFC 3339 rendering for wire fields and CLI output. Formatting only
/// fails outside the representable year range, in which case the plain
/// `Display` form is used instead.
pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}
