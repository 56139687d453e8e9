//! End-to-end flows over in-memory fakes of the geocoding service and the
//! place/visit backends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::macros::datetime;

use citymap::composer::ComposerState;
use citymap::controller::BrowseController;
use citymap::error::Error;
use citymap::geocode::GeocodeResolver;
use citymap::model::{Coordinate, Place, PlaceDraft, Visit};
use citymap::repository::{PlaceStore, VisitLedger};

const ALICE: &str = "alice@example.com";
const BOB: &str = "bob@example.com";

fn eiffel() -> Coordinate {
    Coordinate::new(48.8584, 2.2945).unwrap()
}

struct FakeGeocoder {
    atlas: HashMap<String, Coordinate>,
}

impl FakeGeocoder {
    fn with_eiffel() -> FakeGeocoder {
        let mut atlas = HashMap::new();
        atlas.insert("Eiffel Tower".to_string(), eiffel());

        FakeGeocoder { atlas }
    }
}

#[async_trait]
impl GeocodeResolver for FakeGeocoder {
    async fn resolve(&self, label: &str) -> Result<Option<Coordinate>, Error> {
        let query = label.trim();

        if query.is_empty() {
            return Ok(None);
        }

        self.atlas
            .get(query)
            .copied()
            .map(Some)
            .ok_or_else(|| Error::ResolutionFailed {
                label: query.to_string(),
            })
    }
}

#[derive(Default)]
struct FakeStore {
    places: Mutex<Vec<Place>>,
    appends: AtomicUsize,
    fail_fetch: bool,
    fail_append: bool,
}

impl FakeStore {
    fn seeded(place: Place) -> FakeStore {
        let store = FakeStore::default();
        store.places.lock().unwrap().push(place);
        store
    }

    fn unavailable() -> FakeStore {
        FakeStore {
            fail_fetch: true,
            fail_append: true,
            ..FakeStore::default()
        }
    }
}

#[async_trait]
impl PlaceStore for FakeStore {
    async fn fetch_by_owner(&self, owner: &str) -> Result<Vec<Place>, Error> {
        if self.fail_fetch {
            return Err(Error::StoreUnavailable("backend down".to_string()));
        }

        Ok(self
            .places
            .lock()
            .unwrap()
            .iter()
            .filter(|place| place.owner == owner)
            .cloned()
            .collect())
    }

    async fn append(&self, draft: &PlaceDraft) -> Result<Place, Error> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        draft.validate()?;

        if self.fail_append {
            return Err(Error::StoreUnavailable("backend down".to_string()));
        }

        let coordinate = draft.coordinate.unwrap();
        let mut places = self.places.lock().unwrap();
        let place = Place {
            id: format!("{}", places.len() + 1),
            owner: draft.owner.clone(),
            label: draft.label.clone(),
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            occurred_at: draft.occurred_at.unwrap(),
            image: draft.image.as_ref().map(|image| image.file_name.clone()),
        };
        places.push(place.clone());

        Ok(place)
    }
}

#[derive(Default)]
struct FakeLedger {
    visits: Mutex<Vec<Visit>>,
    fail_record: bool,
    fail_history: bool,
}

#[async_trait]
impl VisitLedger for FakeLedger {
    async fn record(&self, visit: &Visit) -> Result<(), Error> {
        if self.fail_record {
            return Err(Error::RecordFailed("ledger down".to_string()));
        }

        self.visits.lock().unwrap().push(visit.clone());

        Ok(())
    }

    async fn fetch_history(&self, owner: &str) -> Result<Vec<Visit>, Error> {
        if self.fail_history {
            return Err(Error::StoreUnavailable("ledger down".to_string()));
        }

        Ok(self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|visit| visit.owner == owner)
            .cloned()
            .collect())
    }
}

fn seeded_place(id: &str, owner: &str) -> Place {
    Place {
        id: id.to_string(),
        owner: owner.to_string(),
        label: "Puerta del Sol".to_string(),
        latitude: 40.4169,
        longitude: -3.7035,
        occurred_at: datetime!(2024-05-20 18:30 UTC),
        image: None,
    }
}

fn controller(
    geocoder: FakeGeocoder,
    store: Arc<FakeStore>,
    ledger: Arc<FakeLedger>,
    visitor: &str,
) -> BrowseController {
    BrowseController::new(Arc::new(geocoder), store, ledger, visitor)
}

#[tokio::test]
async fn browsing_records_a_visit_for_the_browsing_identity() {
    let store = Arc::new(FakeStore::seeded(seeded_place("1", ALICE)));
    let ledger = Arc::new(FakeLedger::default());
    let mut controller = controller(
        FakeGeocoder::with_eiffel(),
        Arc::clone(&store),
        Arc::clone(&ledger),
        BOB,
    );

    controller.browse(ALICE).await;

    let recorded = ledger.visits.lock().unwrap().clone();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].owner, ALICE);
    assert_eq!(recorded[0].visitor, BOB);

    // The ledger is eventually consistent; a later browse sees the visit.
    let view = controller.browse(ALICE).await;
    assert_eq!(view.visits.len(), 1);
    assert_eq!(view.visits[0].visitor, BOB);
}

#[tokio::test]
async fn owner_with_no_visits_gets_an_empty_history() {
    let store = Arc::new(FakeStore::default());
    let ledger = Arc::new(FakeLedger::default());
    let mut controller = controller(FakeGeocoder::with_eiffel(), store, ledger, BOB);

    let view = controller.browse(ALICE).await;
    assert!(view.visits.is_empty());
    assert!(view.notices.is_empty());
}

#[tokio::test]
async fn submitted_place_appears_after_the_refresh_fetch() {
    let store = Arc::new(FakeStore::default());
    let ledger = Arc::new(FakeLedger::default());
    let mut controller = controller(
        FakeGeocoder::with_eiffel(),
        Arc::clone(&store),
        ledger,
        ALICE,
    );

    let ticket = controller.begin(ALICE);
    let places = store.fetch_by_owner(ALICE).await;
    controller.apply_places(&ticket, places);

    controller.edit_label("Eiffel Tower").await;
    controller.set_date(datetime!(2024-06-01 12:00 UTC));
    controller.submit_place().await.unwrap();

    // The commit leaves the composer ready for the next draft.
    assert_eq!(controller.composer().state(), ComposerState::Idle);
    assert_eq!(controller.composer().label(), "");

    let view = controller.view().unwrap();
    assert_eq!(view.places.len(), 1);
    assert_eq!(view.places[0].label, "Eiffel Tower");
    assert_eq!(view.places[0].latitude, eiffel().latitude());
    assert_eq!(view.places[0].longitude, eiffel().longitude());
    assert_eq!(view.places[0].occurred_at, datetime!(2024-06-01 12:00 UTC));
}

#[tokio::test]
async fn incomplete_submit_never_reaches_the_store() {
    let store = Arc::new(FakeStore::default());
    let ledger = Arc::new(FakeLedger::default());
    let mut controller = controller(
        FakeGeocoder::with_eiffel(),
        Arc::clone(&store),
        ledger,
        ALICE,
    );

    controller.edit_label("Eiffel Tower").await;
    // No date supplied.
    let result = controller.submit_place().await;

    assert!(matches!(result, Err(Error::IncompletePlace("occurredAt"))));
    assert_eq!(store.appends.load(Ordering::SeqCst), 0);
    assert_eq!(controller.composer().state(), ComposerState::Failed);
}

#[tokio::test]
async fn store_failure_keeps_the_draft_for_retry() {
    let store = Arc::new(FakeStore::unavailable());
    let ledger = Arc::new(FakeLedger::default());
    let mut controller = controller(
        FakeGeocoder::with_eiffel(),
        Arc::clone(&store),
        ledger,
        ALICE,
    );

    controller.edit_label("Eiffel Tower").await;
    controller.set_date(datetime!(2024-06-01 12:00 UTC));

    let result = controller.submit_place().await;
    assert!(matches!(result, Err(Error::StoreUnavailable(_))));
    assert_eq!(controller.composer().state(), ComposerState::Failed);

    // Entered fields survive for retry; only coordinates are dropped.
    assert_eq!(controller.composer().label(), "Eiffel Tower");
}

#[tokio::test]
async fn history_failure_does_not_suppress_places() {
    let store = Arc::new(FakeStore::seeded(seeded_place("1", ALICE)));
    let ledger = Arc::new(FakeLedger {
        fail_history: true,
        ..FakeLedger::default()
    });
    let mut controller = controller(FakeGeocoder::with_eiffel(), store, ledger, BOB);

    let view = controller.browse(ALICE).await;

    assert_eq!(view.places.len(), 1);
    assert!(view.visits.is_empty());
    assert!(!view.notices.is_empty());
}

#[tokio::test]
async fn record_failure_does_not_suppress_the_page() {
    let store = Arc::new(FakeStore::seeded(seeded_place("1", ALICE)));
    let ledger = Arc::new(FakeLedger {
        fail_record: true,
        ..FakeLedger::default()
    });
    let mut controller = controller(FakeGeocoder::with_eiffel(), store, ledger, BOB);

    let view = controller.browse(ALICE).await;

    assert_eq!(view.places.len(), 1);
    assert_eq!(view.notices.len(), 1);
    assert!(view.notices[0].contains("visit recording failed"));
}

#[tokio::test]
async fn results_for_an_abandoned_view_are_discarded() {
    let store = Arc::new(FakeStore::seeded(seeded_place("1", ALICE)));
    let ledger = Arc::new(FakeLedger::default());
    let mut controller = controller(
        FakeGeocoder::with_eiffel(),
        Arc::clone(&store),
        ledger,
        BOB,
    );

    let stale = controller.begin(ALICE);
    let stale_places = store.fetch_by_owner(ALICE).await;

    // The user navigates away before the first load lands.
    let current = controller.begin("carol@example.com");
    controller.apply_places(&stale, stale_places);

    let view = controller.view().unwrap();
    assert_eq!(view.owner, "carol@example.com");
    assert!(view.places.is_empty());

    let current_places = store.fetch_by_owner("carol@example.com").await;
    controller.apply_places(&current, current_places);
    assert!(controller.view().unwrap().places.is_empty());
}

#[tokio::test]
async fn unresolvable_label_fails_the_composer_but_not_the_view() {
    let store = Arc::new(FakeStore::seeded(seeded_place("1", ALICE)));
    let ledger = Arc::new(FakeLedger::default());
    let mut controller = controller(
        FakeGeocoder::with_eiffel(),
        Arc::clone(&store),
        ledger,
        ALICE,
    );

    controller.browse(ALICE).await;
    controller.edit_label("Atlantis").await;

    assert_eq!(controller.composer().state(), ComposerState::Failed);
    assert!(controller.composer().notice().unwrap().contains("Atlantis"));
    assert_eq!(controller.view().unwrap().places.len(), 1);
}
