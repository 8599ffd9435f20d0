pub mod app;
pub mod checklist;
pub mod config;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod history;
pub mod models;
pub mod share;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::LocalStore;
