use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::error::Error;
use crate::model::{format_rfc3339, Place, PlaceDraft};

#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Returns the owner's full collection in backend order. An empty
    /// collection is a valid result, not an error.
    async fn fetch_by_owner(&self, owner: &str) -> Result<Vec<Place>, Error>;

    /// Appends a new place record. Incomplete drafts are rejected locally,
    /// before any network call. Append is not read-your-writes: callers
    /// re-fetch the collection to observe the new record.
    async fn append(&self, draft: &PlaceDraft) -> Result<Place, Error>;
}

pub struct HttpPlaceStore {
    client: Client,
    base_url: String,
}

impl HttpPlaceStore {
    pub fn new(base_url: impl Into<String>) -> HttpPlaceStore {
        HttpPlaceStore {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PlaceStore for HttpPlaceStore {
    async fn fetch_by_owner(&self, owner: &str) -> Result<Vec<Place>, Error> {
        self.client
            .get(format!("{}/places/{owner}", self.base_url))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))
    }

    async fn append(&self, draft: &PlaceDraft) -> Result<Place, Error> {
        let (coordinate, occurred_at) = draft.complete()?;

        let mut form = Form::new()
            .text("label", draft.label.clone())
            .text("latitude", coordinate.latitude().to_string())
            .text("longitude", coordinate.longitude().to_string())
            .text("occurredAt", format_rfc3339(occurred_at))
            .text("owner", draft.owner.clone());

        if let Some(image) = &draft.image {
            form = form.part(
                "image",
                Part::bytes(image.bytes.clone()).file_name(image.file_name.clone()),
            );
        }

        self.client
            .post(format!("{}/places", self.base_url))
            .multipart(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))
    }
}
