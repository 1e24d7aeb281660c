pub mod app;
pub mod config;
pub mod counter;
pub mod errors;
pub mod event_log;
pub mod handlers;
pub mod models;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use event_log::EventLog;
pub use state::AppState;
pub use storage::{FileSheet, MemorySheet, Sheet};
