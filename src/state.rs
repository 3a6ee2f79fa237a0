use crate::storage::JsonFileStore;
use crate::tracker::PuffTracker;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedTracker = Arc<Mutex<PuffTracker<JsonFileStore>>>;

#[derive(Clone)]
pub struct AppState {
    pub tracker: SharedTracker,
}

impl AppState {
    pub fn new(tracker: PuffTracker<JsonFileStore>) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
        }
    }
}
