//! This library contains definitions for the API layer.

use app::catalog::ProductCatalog;
use rocket::{Build, Rocket};
use state::RocketState;

mod error;
mod routes;
mod state;

pub use state::SharedStore;

pub fn register(
    rocket: Rocket<Build>,
    store: SharedStore,
    catalog: ProductCatalog,
) -> Rocket<Build> {
    routes::register(rocket, RocketState { store, catalog })
}
