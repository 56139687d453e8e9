//! Orchestration of a browse view: load an owner's places and visit
//! history, record the visit, and combine whatever loaded into one view.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::composer::PlaceComposer;
use crate::error::Error;
use crate::geocode::GeocodeResolver;
use crate::map_view::{self, MapDocument};
use crate::model::{ImageAttachment, Place, Visit};
use crate::repository::{PlaceStore, VisitLedger};

/// Everything the browse page shows for one owner. Each load operation
/// fills its own slot; a failed operation leaves its slot empty and adds
/// a notice instead of suppressing the rest.
#[derive(Debug, Clone)]
pub struct BrowseView {
    pub owner: String,
    pub places: Vec<Place>,
    pub visits: Vec<Visit>,
    pub notices: Vec<String>,
}

impl BrowseView {
    fn empty(owner: &str) -> BrowseView {
        BrowseView {
            owner: owner.to_string(),
            places: Vec::new(),
            visits: Vec::new(),
            notices: Vec::new(),
        }
    }
}

/// Identifies the browse activation a load result belongs to. Results
/// arriving for an abandoned activation are discarded.
#[derive(Debug, Clone, Copy)]
pub struct LoadTicket {
    epoch: u64,
}

pub struct BrowseController {
    resolver: Arc<dyn GeocodeResolver>,
    store: Arc<dyn PlaceStore>,
    ledger: Arc<dyn VisitLedger>,
    /// The signed-in identity, attributed as visitor on recorded visits.
    visitor: String,
    composer: PlaceComposer,
    epoch: u64,
    view: Option<BrowseView>,
}

impl BrowseController {
    pub fn new(
        resolver: Arc<dyn GeocodeResolver>,
        store: Arc<dyn PlaceStore>,
        ledger: Arc<dyn VisitLedger>,
        visitor: impl Into<String>,
    ) -> BrowseController {
        let visitor = visitor.into();

        BrowseController {
            resolver,
            store,
            ledger,
            composer: PlaceComposer::new(visitor.clone()),
            visitor,
            epoch: 0,
            view: None,
        }
    }

    pub fn view(&self) -> Option<&BrowseView> {
        self.view.as_ref()
    }

    pub fn composer(&self) -> &PlaceComposer {
        &self.composer
    }

    /// Starts a new browse activation for `owner`, abandoning the previous
    /// one: in-flight results holding older tickets will be discarded.
    pub fn begin(&mut self, owner: &str) -> LoadTicket {
        self.epoch += 1;
        self.view = Some(BrowseView::empty(owner));
        info!(owner, "browsing");

        LoadTicket { epoch: self.epoch }
    }

    pub fn apply_places(&mut self, ticket: &LoadTicket, outcome: Result<Vec<Place>, Error>) {
        let Some(view) = self.current_view(ticket) else {
            return;
        };

        match outcome {
            Ok(places) => view.places = places,
            Err(error) => {
                warn!(%error, "failed to load places");
                view.notices.push(error.to_string());
            }
        }
    }

    pub fn apply_visits(&mut self, ticket: &LoadTicket, outcome: Result<Vec<Visit>, Error>) {
        let Some(view) = self.current_view(ticket) else {
            return;
        };

        match outcome {
            Ok(visits) => view.visits = visits,
            Err(error) => {
                warn!(%error, "failed to load visit history");
                view.notices.push(error.to_string());
            }
        }
    }

    /// Visit recording is best-effort: failure becomes a logged notice,
    /// never a reason to suppress the rest of the page.
    pub fn apply_record_outcome(&mut self, ticket: &LoadTicket, outcome: Result<(), Error>) {
        let Some(view) = self.current_view(ticket) else {
            return;
        };

        if let Err(error) = outcome {
            warn!(%error, "failed to record visit");
            view.notices.push(error.to_string());
        }
    }

    /// Full browse flow for one owner: fetch places, fetch visit history,
    /// record the visit, then expose whatever loaded. The three calls are
    /// independent; one failing does not stop the others.
    pub async fn browse(&mut self, owner: &str) -> &BrowseView {
        let ticket = self.begin(owner);

        let places = self.store.fetch_by_owner(owner).await;
        self.apply_places(&ticket, places);

        let visits = self.ledger.fetch_history(owner).await;
        self.apply_visits(&ticket, visits);

        let visit = Visit::now(owner, self.visitor.clone());
        let recorded = self.ledger.record(&visit).await;
        self.apply_record_outcome(&ticket, recorded);

        self.view.get_or_insert_with(|| BrowseView::empty(owner))
    }

    /// Routes a label edit through the composer and runs the resolution it
    /// asks for, feeding the tagged response back.
    pub async fn edit_label(&mut self, label: &str) {
        if let Some(request) = self.composer.edit_label(label) {
            let outcome = self.resolver.resolve(&request.label).await;
            self.composer.apply_resolution(&request, outcome);
        }
    }

    pub fn set_date(&mut self, when: OffsetDateTime) {
        self.composer.set_date(when);
    }

    pub fn attach_image(&mut self, image: ImageAttachment) {
        self.composer.attach_image(image);
    }

    /// Submits the composed draft. On success the owner's collection is
    /// re-fetched (append is not read-your-writes) and the composer resets;
    /// on failure the composer keeps its fields for retry.
    pub async fn submit_place(&mut self) -> Result<(), Error> {
        let draft = self.composer.submit()?;

        match self.store.append(&draft).await {
            Ok(created) => {
                debug!(id = %created.id, "place stored");
                self.composer.committed();
                let refreshed = self.store.fetch_by_owner(&draft.owner).await;
                self.refresh_places(&draft.owner, refreshed);
                self.composer.reset();
                Ok(())
            }
            Err(error) => {
                self.composer.commit_failed(&error);
                Err(error)
            }
        }
    }

    /// Renders the current view plus the composer's preview marker.
    pub fn render(&self, tile_url: &str) -> Option<MapDocument> {
        self.view
            .as_ref()
            .map(|view| map_view::render(&view.places, self.composer.preview(), tile_url))
    }

    fn refresh_places(&mut self, owner: &str, outcome: Result<Vec<Place>, Error>) {
        let Some(view) = self.view.as_mut().filter(|view| view.owner == owner) else {
            return;
        };

        match outcome {
            Ok(places) => view.places = places,
            Err(error) => {
                warn!(%error, "failed to refresh places after append");
                view.notices.push(error.to_string());
            }
        }
    }

    fn current_view(&mut self, ticket: &LoadTicket) -> Option<&mut BrowseView> {
        if ticket.epoch != self.epoch {
            debug!("discarding load result for abandoned view");
            return None;
        }

        self.view.as_mut()
    }
}
