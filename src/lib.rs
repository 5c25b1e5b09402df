pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::storage::LocalStorage;
pub use config::{Cli, Command, TomlConfig};
pub use crate::core::{etl::EtlEngine, pipeline::FashionPipeline};
pub use utils::error::{EtlError, Result};
