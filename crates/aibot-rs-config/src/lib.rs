//! aibot settings: the JSON5 schema, layered discovery and environment overrides.
//!
//! Secrets are never read from files. [`AibotConfig::apply_env`] fills the LLM
//! credentials from the process environment after loading.

mod env;
mod error;
mod loader;
mod model;

pub use env::{EnvSource, ProcessEnv, vars};
pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
pub use model::*;
