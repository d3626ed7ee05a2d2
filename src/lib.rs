//! Identify an animal from a photo or a typed name and show its Wikipedia
//! summary.

pub mod app;
pub mod classifier;
pub mod config;
pub mod console;
pub mod encyclopedia;
pub mod error;
pub mod filter;
pub mod logging;
pub mod preprocess;
pub mod search;
pub mod ui;
