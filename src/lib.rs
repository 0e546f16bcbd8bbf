pub mod app;
pub mod broadcast;
pub mod completion;
pub mod config;
pub mod controller;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod runtime;
pub mod state;
pub mod storage;
pub mod store;
pub mod sync;
pub mod ticker;
pub mod ui;

pub use app::router;
pub use config::{Config, TickerTiming};
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
