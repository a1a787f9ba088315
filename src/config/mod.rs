//! Configuration
//!
//! Immutable configuration types and the figment-based loader.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    ApiConfig, ArticleConfig, Config, ImageConfig, QueueConfig, TextConfig, UsageConfig,
};
