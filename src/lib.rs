//! Client core for recording and browsing geotagged places.
//!
//! An authenticated user records places (label, coordinates, timestamp,
//! optional image) against their account; anyone can browse another
//! account's places by email, which logs a visit against that owner. The
//! place and visit backends, the geocoding service, and the basemap
//! provider are external services reached over HTTP.

pub mod composer;
pub mod config;
pub mod controller;
pub mod error;
pub mod geocode;
pub mod map_view;
pub mod model;
pub mod repository;
