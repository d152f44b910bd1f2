use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use app::catalog::ProductCatalog;
use app::database::{self, run_migrations};
use app::store::PgStore;
use rocket::{launch, Build, Rocket};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct Config {
    database_url: Url,
    /// Upper bound on any single ledger store call. A timed-out call is a
    /// failed call; retrying is safe.
    #[serde(default = "default_storage_timeout_secs")]
    storage_timeout_secs: u64,
    /// Optional catalog override. Falls back to the built-in product table.
    catalog: Option<HashMap<String, i64>>,
}

fn default_storage_timeout_secs() -> u64 {
    10
}

#[launch]
async fn rocket() -> _ {
    start_server().await
}

async fn start_server() -> Rocket<Build> {
    env_logger::init();

    let rocket = Rocket::build();
    let config: Config = rocket.figment().extract().unwrap();

    let db = database::connect(&config.database_url).await.unwrap();
    run_migrations(&db).await;
    #[cfg(debug_assertions)]
    app::database::seed_development_data(&db).await;

    let store = PgStore::new(db, Duration::from_secs(config.storage_timeout_secs));
    let catalog = match config.catalog {
        Some(products) => ProductCatalog::new(products),
        None => ProductCatalog::default(),
    };

    api::register(rocket, Arc::new(store), catalog)
}
