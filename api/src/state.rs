use app::catalog::ProductCatalog;
use app::store::LedgerStore;
use std::sync::Arc;

pub type SharedStore = Arc<dyn LedgerStore>;

pub struct RocketState {
    pub store: SharedStore,
    pub catalog: ProductCatalog,
}
