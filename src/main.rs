use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{fmt, EnvFilter};

use citymap::config::Config;
use citymap::controller::BrowseController;
use citymap::geocode::HttpGeocodeResolver;
use citymap::model::{format_rfc3339, ImageAttachment};
use citymap::repository::{HttpPlaceStore, HttpVisitLedger, PlaceStore};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load()?;
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("browse") => {
            let owner = args
                .get(2)
                .context("usage: citymap browse <owner-email>")?;
            browse(&config, owner).await
        }
        Some("add") => add(&config, &args[2..]).await,
        Some(other) => bail!("unknown action {other}"),
        None => bail!("usage: citymap <browse|add> ..."),
    }
}

fn wire(config: &Config) -> (BrowseController, Arc<dyn PlaceStore>) {
    let resolver = Arc::new(HttpGeocodeResolver::new(config.geocoder_url.clone()));
    let store: Arc<dyn PlaceStore> = Arc::new(HttpPlaceStore::new(config.backend_url.clone()));
    let ledger = Arc::new(HttpVisitLedger::new(config.backend_url.clone()));

    let controller = BrowseController::new(
        resolver,
        Arc::clone(&store),
        ledger,
        config.identity.clone(),
    );

    (controller, store)
}

async fn browse(config: &Config, owner: &str) -> Result<()> {
    let (mut controller, _) = wire(config);
    controller.browse(owner).await;

    let Some(view) = controller.view() else {
        return Ok(());
    };

    println!("Places of {owner}:");

    if let Some(doc) = controller.render(&config.tile_url) {
        print!("{doc}");
    }

    println!("Visits:");

    for visit in &view.visits {
        println!("{}  {}", visit.visitor, format_rfc3339(visit.occurred_at));
    }

    for notice in &view.notices {
        println!("! {notice}");
    }

    Ok(())
}

async fn add(config: &Config, args: &[String]) -> Result<()> {
    let [label, date, rest @ ..] = args else {
        bail!("usage: citymap add <label> <rfc3339-date> [image-path]");
    };

    let when =
        OffsetDateTime::parse(date, &Rfc3339).context("date must be an RFC 3339 timestamp")?;

    let (mut controller, store) = wire(config);

    // Load the signed-in user's own collection so the commit refresh has a
    // view to land in. Browsing your own map records no visit.
    let ticket = controller.begin(&config.identity);
    let places = store.fetch_by_owner(&config.identity).await;
    controller.apply_places(&ticket, places);

    controller.edit_label(label).await;
    controller.set_date(when);

    if let Some(path) = rest.first() {
        let bytes =
            std::fs::read(path).with_context(|| format!("unable to read image {path}"))?;
        let file_name = Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        controller.attach_image(ImageAttachment { file_name, bytes });
    }

    controller.submit_place().await?;
    println!("Added {label}");

    if let Some(doc) = controller.render(&config.tile_url) {
        print!("{doc}");
    }

    Ok(())
}
