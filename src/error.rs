use thiserror::Error;

/// Failure taxonomy for the place-and-visit core.
///
/// Validation variants are raised before any network call; the remaining
/// variants wrap upstream failures. None of them is fatal to the process:
/// callers surface them as notices and let the user retry.
#[derive(Debug, Error)]
pub enum Error {
    #[error("place is missing required field `{0}`")]
    IncompletePlace(&'static str),

    #[error("{axis} {value} is out of range")]
    InvalidCoordinate { axis: &'static str, value: f64 },

    #[error("could not resolve \"{label}\" to coordinates")]
    ResolutionFailed { label: String },

    #[error("place backend unavailable: {0}")]
    StoreUnavailable(String),

    #[error("visit recording failed: {0}")]
    RecordFailed(String),

    #[error("visit history is not a sequence")]
    MalformedHistory,
}
