pub mod config;
pub mod engines;
pub mod error;
pub mod jobs;
pub mod types;

pub use error::{GenpaintError, Result};
