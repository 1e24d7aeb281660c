use crate::event_log::EventLog;
use crate::session::SessionStore;
use crate::stats::InitialVisitors;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub log: Arc<EventLog>,
    pub sessions: SessionStore,
    pub password: Arc<str>,
    pub initial_visitors: InitialVisitors,
}

impl AppState {
    pub fn new(
        log: EventLog,
        password: impl Into<Arc<str>>,
        initial_visitors: InitialVisitors,
    ) -> Self {
        Self {
            log: Arc::new(log),
            sessions: SessionStore::new(),
            password: password.into(),
            initial_visitors,
        }
    }
}
