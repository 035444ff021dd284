//! Engine and device configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! changes:
//!
//! ```json
//! { "bootstrap": "entropy", "block_size": 256, "writable": false }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default bytes per copy to the caller.
pub const DEFAULT_BLOCK_SIZE: usize = 64;

/// Largest accepted block size.
pub const MAX_BLOCK_SIZE: usize = 65536;

/// Default number of refill attempts before a reseed is declared failed.
pub const DEFAULT_RESEED_ATTEMPTS: u32 = 3;

/// How the pool is brought out of the all-zero state at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bootstrap {
    /// Set cell 0 and run one full revolution of steps. Deterministic:
    /// every process starts from the canonical self-test state.
    #[default]
    Rule30,
    /// Reseed from the seed source before the first request.
    Entropy,
}

impl std::fmt::Display for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rule30 => write!(f, "rule30"),
            Self::Entropy => write!(f, "entropy"),
        }
    }
}

impl std::str::FromStr for Bootstrap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rule30" | "rule-30" | "deterministic" => Ok(Self::Rule30),
            "entropy" | "os" | "random" => Ok(Self::Entropy),
            other => Err(Error::Config(format!("unknown bootstrap mode '{other}'"))),
        }
    }
}

/// Configuration for an engine and the device wrapping it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Startup procedure.
    pub bootstrap: Bootstrap,
    /// Bytes extracted per copy to the caller.
    pub block_size: usize,
    /// Whether writes are injected into the pool.
    pub writable: bool,
    /// Refill attempts per reseed.
    pub reseed_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bootstrap: Bootstrap::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            writable: true,
            reseed_attempts: DEFAULT_RESEED_ATTEMPTS,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("loaded engine config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::Config(format!(
                "block_size must be 1..={MAX_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        if self.reseed_attempts == 0 {
            return Err(Error::Config("reseed_attempts must be at least 1".into()));
        }
        Ok(())
    }
}
