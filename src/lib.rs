//! Harvest - declarative data extraction engine
//!
//! An operator supplies a tree of extraction items - each pairing a *source*
//! (how to fetch raw bytes) with a *shape* (how to parse and project bytes
//! into a JSON value) - and the engine produces a structured artifact that is
//! delivered to one or more notifiers.
//!
//! # Features
//!
//! - **Three query dialects**: dotted-path JSON, CSS selectors, XPath 1.0
//! - **Recursive models**: objects, arrays, first-of fallbacks, generated
//!   fields (static, templated, computed, sub-extraction, plugin)
//! - **Bounded concurrency**: global, per-host and browser semaphores
//! - **Sources**: static, HTTP, headless browser, file, reference, sequence
//! - **Sinks**: console, file, HTTP, pluggable

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod connectors;
pub mod engine;
pub mod error;
pub mod expression;
pub mod limits;
pub mod notify;
pub mod parse;
pub mod plugins;
pub mod references;
pub mod value;

pub use engine::{Engine, Runtime};
pub use error::{Error, Result};
pub use value::Jsonable;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
