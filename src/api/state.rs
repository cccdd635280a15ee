use std::sync::Arc;

use crate::services::{PayloadRecorder, SyncEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub recorder: Arc<dyn PayloadRecorder>,
}

impl AppState {
    pub fn new(engine: Arc<SyncEngine>, recorder: Arc<dyn PayloadRecorder>) -> Self {
        Self { engine, recorder }
    }
}
