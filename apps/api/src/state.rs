use crate::jobs::dispatcher::Dispatcher;
use crate::store::JobStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main`; holds the only handles to the store and the worker pool.
#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    /// Creates jobs and feeds them to the worker pool.
    pub dispatcher: Dispatcher,
}
