pub mod bootstrap;
pub mod cli;
pub mod comments;
pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod posts;
pub mod telemetry;
pub mod thread_path;
pub mod utils;

pub use error::{BlogError, Result};
