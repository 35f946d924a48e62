pub mod app;
pub mod cli;
pub mod config;
pub mod format;
pub mod highlight;
pub mod media;
pub mod model;
pub mod search;
pub mod storage;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
