//! Layered configuration for snuffle: built-in defaults, then a TOML, YAML or
//! JSON file, then `SNUFFLE_*` environment variables.

pub mod error;
mod load;
mod model;

pub use crate::load::{ENV_PREFIX, default_path, load};
pub use crate::model::{Config, LocalView, ResourceConfig, RulesConfig, Secret};
