mod place;
mod visit;

pub use place::{format_rfc3339, Coordinate, ImageAttachment, Place, PlaceDraft};
pub use visit::Visit;
