mod place;
mod visit;

pub use place::{HttpPlaceStore, PlaceStore};
pub use visit::{HttpVisitLedger, VisitLedger};
