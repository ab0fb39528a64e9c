use axum::routing::get;
use axum::Router;
use coinstats_warehouse::ObservationStore;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: ObservationStore,
}

impl AppState {
    pub fn new(store: ObservationStore) -> Self {
        Self { store }
    }
}

/// Build the query service router.
pub fn create_router(store: ObservationStore) -> Router {
    Router::new()
        .route("/", get(handlers::list_exchanges))
        .route("/:exchange", get(handlers::list_currency_codes))
        .route("/:exchange/:currency_code", get(handlers::latest_observation))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(store))
}
