use std::sync::Arc;

use crate::config::Config;
use crate::storage::{admin_store::AdminStore, exam_store::ExamStore, result_store::ResultStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub exams: Arc<dyn ExamStore>,
    pub results: Arc<dyn ResultStore>,
    pub admins: AdminStore,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn ExamStore> {
    fn from_ref(state: &AppState) -> Self {
        state.exams.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ResultStore> {
    fn from_ref(state: &AppState) -> Self {
        state.results.clone()
    }
}

impl FromRef<AppState> for AdminStore {
    fn from_ref(state: &AppState) -> Self {
        state.admins.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
