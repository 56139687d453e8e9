use std::env;

use anyhow::{Context, Result};
use tracing::info;

use crate::map_view::DEFAULT_TILE_URL;

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8082";

/// Service endpoints and the signed-in identity, loaded once at startup
/// and injected into the components that need them.
pub struct Config {
    pub geocoder_url: String,
    pub backend_url: String,
    pub tile_url: String,
    /// Email of the signed-in user, supplied by the external identity
    /// provider. Treated as opaque and already validated.
    pub identity: String,
}

impl Config {
    pub fn load() -> Result<Config> {
        Ok(Config {
            geocoder_url: try_load("CITYMAP_GEOCODER_URL", DEFAULT_GEOCODER_URL),
            backend_url: try_load("CITYMAP_BACKEND_URL", DEFAULT_BACKEND_URL),
            tile_url: try_load("CITYMAP_TILE_URL", DEFAULT_TILE_URL),
            identity: env::var("CITYMAP_IDENTITY")
                .context("CITYMAP_IDENTITY must be set to the signed-in email")?,
        })
    }
}

fn try_load(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
