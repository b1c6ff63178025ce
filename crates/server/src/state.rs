use std::sync::Arc;

use common::posts::PostSource;

/// Shared per-router state. Holds no data between requests.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostSource>,
    pub heading: Arc<str>,
}

impl AppState {
    pub fn new(posts: Arc<dyn PostSource>, heading: impl Into<Arc<str>>) -> Self {
        Self { posts, heading: heading.into() }
    }
}
