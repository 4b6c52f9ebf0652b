pub mod adapters;
pub mod app;
pub mod codec;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::http::{FetchSettings, HttpPageFetcher};
pub use crate::config::{cli::LocalStorage, toml_config::LabelConfig};
pub use crate::core::{etl::LabelEngine, pipeline::LabelPipeline};
pub use crate::utils::error::{LabelError, Result};
