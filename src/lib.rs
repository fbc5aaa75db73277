pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, toml_config::TomlConfig, CliConfig};
pub use core::engine::{AssemblyInfoEngine, PlannedFile, RunPlan};
pub use domain::metadata::{AssemblyMetadata, AttributeKind, InvalidMetadataValue};
pub use domain::version::{VersionNumber, VersionPart};
pub use utils::error::{AssemblyInfoError, Result};
