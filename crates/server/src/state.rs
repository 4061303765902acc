use std::sync::Arc;

use prep_services::AppServices;

/// Shared handler state: the service layer behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<AppServices>,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}
