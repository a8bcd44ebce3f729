use std::path::PathBuf;
use std::sync::Arc;

use crate::service::AnalysisService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub app_name: String,
    /// Re-read on every `GET /examples`
    pub examples_file: Option<PathBuf>,
}

impl AppState {
    pub fn new(service: Arc<AnalysisService>, app_name: impl Into<String>) -> Self {
        Self {
            service,
            app_name: app_name.into(),
            examples_file: None,
        }
    }

    pub fn with_examples_file(mut self, path: Option<PathBuf>) -> Self {
        self.examples_file = path;
        self
    }
}
