// Library surface for the binary, headless integration tests and reuse.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod texts;
pub mod ui;

pub use error::{Error, Result};
