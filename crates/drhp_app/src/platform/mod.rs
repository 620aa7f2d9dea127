mod app;
mod config;
mod dropped;
mod effects;
mod input;
mod logging;
mod mime;
mod ui;

pub use app::run_app;
