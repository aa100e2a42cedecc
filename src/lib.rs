pub mod app;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod kana;
pub mod models;
pub mod reconcile;
pub mod roster;
pub mod sheet;
pub mod state;
pub mod storage;
pub mod time;
pub mod ui;
pub mod views;

pub use app::router;
pub use config::Config;
pub use gateway::Gateway;
pub use state::AppState;
