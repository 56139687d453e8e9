//! Interactive state machine for drafting a new place record.
//!
//! Label edits trigger geocode resolution; every edit bumps a generation
//! counter and each resolution request carries the generation it was issued
//! for, so a stale response can never overwrite a newer preview.

use time::OffsetDateTime;
use tracing::debug;

use crate::error::Error;
use crate::model::{Coordinate, ImageAttachment, PlaceDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    Idle,
    Editing,
    Resolving,
    ReadyToSubmit,
    Submitting,
    Committed,
    Failed,
}

/// A pending geocode lookup, tagged with the label edit that issued it.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    generation: u64,
    pub label: String,
}

pub struct PlaceComposer {
    owner: String,
    state: ComposerState,
    label: String,
    coordinate: Option<Coordinate>,
    occurred_at: Option<OffsetDateTime>,
    image: Option<ImageAttachment>,
    generation: u64,
    notice: Option<String>,
}

impl PlaceComposer {
    pub fn new(owner: impl Into<String>) -> PlaceComposer {
        PlaceComposer {
            owner: owner.into(),
            state: ComposerState::Idle,
            label: String::new(),
            coordinate: None,
            occurred_at: None,
            image: None,
            generation: 0,
            notice: None,
        }
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Coordinates currently shown on the preview map, if any.
    pub fn preview(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Applies a label edit. Returns the resolution request to run next,
    /// or `None` when the trimmed label is empty (resolution is a no-op
    /// on empty input). Ignored while a submit is in flight.
    pub fn edit_label(&mut self, label: &str) -> Option<ResolutionRequest> {
        if self.state == ComposerState::Submitting {
            return None;
        }

        self.leave_terminal_state();
        self.label = label.to_string();
        self.generation += 1;

        let trimmed = self.label.trim();

        if trimmed.is_empty() {
            self.state = ComposerState::Editing;
            return None;
        }

        self.state = ComposerState::Resolving;

        Some(ResolutionRequest {
            generation: self.generation,
            label: trimmed.to_string(),
        })
    }

    /// Applies a finished resolution. Responses whose request generation no
    /// longer matches the composer are stale and get discarded, so
    /// out-of-order arrivals cannot clobber a newer label's preview.
    /// Responses landing in a terminal or submitting state are discarded
    /// too: only user input moves the composer out of those.
    pub fn apply_resolution(
        &mut self,
        request: &ResolutionRequest,
        outcome: Result<Option<Coordinate>, Error>,
    ) {
        let unexpected = matches!(
            self.state,
            ComposerState::Submitting | ComposerState::Committed | ComposerState::Failed
        );

        if request.generation != self.generation || unexpected {
            debug!(label = %request.label, "discarding stale resolution response");
            return;
        }

        match outcome {
            Ok(Some(coordinate)) => {
                self.coordinate = Some(coordinate);
                self.settle();
            }
            // Empty query: preview keeps its prior coordinates.
            Ok(None) => self.settle(),
            Err(error) => {
                self.notice = Some(error.to_string());
                self.state = ComposerState::Failed;
            }
        }
    }

    pub fn set_date(&mut self, when: OffsetDateTime) {
        if self.state == ComposerState::Submitting {
            return;
        }

        self.leave_terminal_state();
        self.occurred_at = Some(when);
        self.touch();
    }

    pub fn attach_image(&mut self, image: ImageAttachment) {
        if self.state == ComposerState::Submitting {
            return;
        }

        self.leave_terminal_state();
        self.image = Some(image);
        self.touch();
    }

    /// Validates the draft locally and hands it over for submission.
    /// Incomplete drafts fail with `IncompletePlace` and no network call
    /// is ever made on their behalf.
    pub fn submit(&mut self) -> Result<PlaceDraft, Error> {
        let draft = PlaceDraft {
            owner: self.owner.clone(),
            label: self.label.clone(),
            coordinate: self.coordinate,
            occurred_at: self.occurred_at,
            image: self.image.clone(),
        };

        match draft.validate() {
            Ok(()) => {
                self.state = ComposerState::Submitting;
                Ok(draft)
            }
            Err(error) => {
                self.notice = Some(error.to_string());
                self.state = ComposerState::Failed;
                Err(error)
            }
        }
    }

    /// The submitted draft was stored; the collection refresh is the
    /// caller's next step. Clears the draft and invalidates any still
    /// in-flight resolution.
    pub fn committed(&mut self) {
        self.state = ComposerState::Committed;
        self.label.clear();
        self.coordinate = None;
        self.occurred_at = None;
        self.image = None;
        self.notice = None;
        self.generation += 1;
    }

    /// Returns a committed composer to `Idle`, ready for the next draft.
    /// A no-op in any other state.
    pub fn reset(&mut self) {
        if self.state == ComposerState::Committed {
            self.state = ComposerState::Idle;
        }
    }

    pub fn commit_failed(&mut self, error: &Error) {
        self.notice = Some(error.to_string());
        self.state = ComposerState::Failed;
    }

    fn is_complete(&self) -> bool {
        !self.label.trim().is_empty() && self.coordinate.is_some() && self.occurred_at.is_some()
    }

    /// Re-entering from `Failed` keeps the entered fields but drops the
    /// coordinates: they must be re-resolved. `Committed` starts fresh.
    fn leave_terminal_state(&mut self) {
        match self.state {
            ComposerState::Failed => {
                self.coordinate = None;
                self.notice = None;
                self.state = ComposerState::Editing;
            }
            ComposerState::Committed => self.state = ComposerState::Idle,
            _ => {}
        }
    }

    /// State after a resolution response has been consumed: the lookup is
    /// no longer outstanding, so the composer is either ready or editing.
    fn settle(&mut self) {
        self.state = if self.is_complete() {
            ComposerState::ReadyToSubmit
        } else {
            ComposerState::Editing
        };
    }

    /// State after a field edit. `Resolving` survives: a lookup is still
    /// outstanding for the current label.
    fn touch(&mut self) {
        if self.is_complete() {
            self.state = ComposerState::ReadyToSubmit;
        } else if matches!(
            self.state,
            ComposerState::Idle | ComposerState::ReadyToSubmit | ComposerState::Committed
        ) {
            self.state = ComposerState::Editing;
        }
    }
}
