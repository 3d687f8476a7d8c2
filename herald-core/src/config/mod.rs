//! Configuration loading.
//!
//! - YAML, TOML and JSON files, detected by extension
//! - `PREFIX_*` environment overrides through [`Configurable`]
//! - validation through [`Validatable`] with path-qualified errors
//!
//! Section types live next to the code they configure; the engine composes
//! them into one document.
//!
//! ```rust,ignore
//! use herald_core::config::ConfigLoader;
//!
//! let config: HeraldConfig = ConfigLoader::new()
//!     .with_env_prefix("HERALD")
//!     .load("herald.yaml")?;
//! ```

mod loader;
mod traits;
pub mod validation;

pub use loader::{ConfigFormat, ConfigLoader};
pub use traits::{Configurable, Validatable};
pub use validation::{EnvOverride, ValidationContext, ValidationResult, Validator};
