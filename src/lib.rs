pub mod app;
pub mod cache;
pub mod errors;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use cache::TableCache;
pub use errors::{AppError, DataLoadError};
pub use filter::EventFilter;
pub use state::AppState;
pub use stats::build_dashboard;
pub use storage::{load_events, resolve_data_path};
