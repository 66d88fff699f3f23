//! Configuration module for Tululu-Scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All keys are optional, so `Config::default()` is a complete configuration.
//!
//! # Example
//!
//! ```no_run
//! use tululu_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tululu.toml")).unwrap();
//! println!("Retrying up to {} times", config.retry.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, ExhaustionPolicy, HttpConfig, OutputConfig, RetryConfig, RunConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
