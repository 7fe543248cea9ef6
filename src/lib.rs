// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires the terminal to these modules.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod export;
pub mod format;
pub mod items;
pub mod logging;
pub mod runtime;
pub mod tracker;
pub mod ui;
