//! Engine and population configuration
//!
//! Loaded from TOML; bulk population can be switched on through the
//! environment with `DUMMY_POPULATE=true`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment flag enabling bulk population
pub const POPULATE_ENV: &str = "DUMMY_POPULATE";
/// Environment override for the lower quantity bound
pub const QUANTITY_MIN_ENV: &str = "SEEDGRAPH_QUANTITY_MIN";
/// Environment override for the exclusive upper quantity bound
pub const QUANTITY_MAX_ENV: &str = "SEEDGRAPH_QUANTITY_MAX";

/// Graph builder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum instantiation stack depth
    pub max_depth: usize,
    /// Elements generated for scalar collections
    pub primitive_collection_len: usize,
    /// Lower bound of foreign-key collection attempts
    pub fk_collection_min: usize,
    /// Exclusive upper bound of foreign-key collection attempts
    pub fk_collection_max: usize,
    /// Base seed; each top-level call derives its own seed from it
    pub seed: Option<u64>,
}

impl EngineConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_primitive_collection_len(mut self, len: usize) -> Self {
        self.primitive_collection_len = len;
        self
    }

    /// With foreign-key collection attempt bounds `[min, max)`
    #[inline]
    #[must_use]
    pub fn with_fk_collection_range(mut self, min: usize, max: usize) -> Self {
        self.fk_collection_min = min;
        self.fk_collection_max = max;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            primitive_collection_len: 20,
            fk_collection_min: 5,
            fk_collection_max: 10,
            seed: None,
        }
    }
}

/// Bulk population policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub enabled: bool,
    /// Lower bound of per-type quantity
    pub min_quantity: usize,
    /// Exclusive upper bound of per-type quantity
    pub max_quantity: usize,
    /// Populate entity types on the rayon pool
    pub parallel: bool,
}

impl PopulationConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_quantity(mut self, min: usize, max: usize) -> Self {
        self.min_quantity = min;
        self.max_quantity = max;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Overlay the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a quantity override is not
    /// a number.
    pub fn from_env(self) -> Result<Self, ConfigError> {
        self.overlay(|name| std::env::var(name).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a quantity override is not
    /// a number.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(flag) = lookup(POPULATE_ENV) {
            self.enabled = flag.trim().eq_ignore_ascii_case("true");
        }
        let number = |name: &str, value: String| {
            value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                name: name.to_string(),
                value,
            })
        };
        if let Some(min) = lookup(QUANTITY_MIN_ENV) {
            self.min_quantity = number(QUANTITY_MIN_ENV, min)?;
        }
        if let Some(max) = lookup(QUANTITY_MAX_ENV) {
            self.max_quantity = number(QUANTITY_MAX_ENV, max)?;
        }
        Ok(self)
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_quantity: 20,
            max_quantity: 50,
            parallel: false,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedgraphConfig {
    pub engine: EngineConfig,
    pub population: PopulationConfig,
}

impl SeedgraphConfig {
    /// Parse TOML configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load a TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }
}
