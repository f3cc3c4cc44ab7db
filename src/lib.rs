// Library surface for the binary and the integration tests.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod input;
pub mod log;
pub mod problem;
pub mod session;
pub mod stats;
pub mod terminal;
