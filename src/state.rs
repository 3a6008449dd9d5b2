use crate::cache::TableCache;
use crate::errors::DataLoadError;
use crate::models::EventTable;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub cache: Arc<Mutex<TableCache>>,
}

impl AppState {
    pub fn new(data_path: PathBuf) -> Self {
        Self {
            data_path,
            cache: Arc::new(Mutex::new(TableCache::new())),
        }
    }

    /// The current event log, re-parsed only if the file changed.
    pub async fn table(&self) -> Result<Arc<EventTable>, DataLoadError> {
        self.cache.lock().await.get_or_load(&self.data_path)
    }
}
