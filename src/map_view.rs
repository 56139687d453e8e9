//! Pure rendering of a place collection onto a coordinate plane.
//!
//! Rendering never fails: zero places means zero markers, and places that
//! share coordinates become overlapping markers (no clustering).

use std::fmt;

use time::OffsetDateTime;

use crate::model::{format_rfc3339, Coordinate, Place};

/// Tile template of the default basemap provider. Purely a rendering
/// dependency; it carries no data semantics.
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// One marker on the map. Identity is the place `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: String,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    pub occurred_at: OffsetDateTime,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    pub tile_url: String,
    pub markers: Vec<Marker>,
    /// Marker for a not-yet-submitted place being composed.
    pub preview: Option<Coordinate>,
}

pub fn render(places: &[Place], preview: Option<Coordinate>, tile_url: &str) -> MapDocument {
    let markers = places
        .iter()
        .map(|place| Marker {
            id: place.id.clone(),
            label: place.label.clone(),
            latitude: place.latitude,
            longitude: place.longitude,
            occurred_at: place.occurred_at,
            image: place.image.clone(),
        })
        .collect();

    MapDocument {
        tile_url: tile_url.to_string(),
        markers,
        preview,
    }
}

impl fmt::Display for MapDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for marker in &self.markers {
            writeln!(
                f,
                "[{}] {} ({}, {}) {}",
                marker.id,
                marker.label,
                marker.latitude,
                marker.longitude,
                format_rfc3339(marker.occurred_at),
            )?;
        }

        if let Some(preview) = self.preview {
            writeln!(
                f,
                "preview marker at ({}, {})",
                preview.latitude(),
                preview.longitude()
            )?;
        }

        Ok(())
    }
}
