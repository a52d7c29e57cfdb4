//! # Runtime Configuration
//!
//! Tuning knobs for the runtime core, loaded once at startup. Everything
//! has a sensible default; a config file only needs to name the knobs it
//! changes.

use serde::Deserialize;

use crate::ecs::CoreError;

/// Tuning knobs applied when building an [`EntityIndex`].
///
/// # Example
///
/// ```rust,ignore
/// let config = CoreConfig::from_toml_str(r#"
///     chunk_capacity = 512
/// "#)?;
/// let index = EntityIndex::with_config(config);
/// ```
///
/// [`EntityIndex`]: crate::ecs::EntityIndex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Instances per arena chunk; arenas grow by this many slots at once.
    pub chunk_capacity: usize,
    /// Entity-id table capacity reserved up front.
    pub id_table_reserve: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            chunk_capacity: 256,
            id_table_reserve: 1024,
        }
    }
}

impl CoreConfig {
    /// Parses a config from TOML text, validating the values.
    pub fn from_toml_str(text: &str) -> Result<Self, CoreError> {
        let config: Self =
            toml::from_str(text).map_err(|err| CoreError::InvalidConfig(err.to_string()))?;
        if config.chunk_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "chunk_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
