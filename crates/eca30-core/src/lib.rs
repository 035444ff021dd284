//! # eca30-core
//!
//! A byte generator driven by elementary cellular automaton Rule 30 on a
//! 257-cell ring.
//!
//! ## Quick Start
//!
//! ```no_run
//! use eca30_core::{Device, EngineConfig};
//!
//! // Deterministic bootstrap, OS entropy for refills
//! let device = Device::new(&EngineConfig::default()).unwrap();
//!
//! let bytes = device.read(256).unwrap();
//! assert_eq!(bytes.len(), 256);
//!
//! // Writes perturb the pool
//! device.write(b"some noise").unwrap();
//! println!("{:?}", device.status());
//! ```
//!
//! ## Architecture
//!
//! [`BitRing`] (257 cells) → [`Automaton`] (Rule 30 step, extraction,
//! injection, reseed) → [`Device`] (locking, block copies, status)
//!
//! Output is read one bit per generation from cell 0. Injected bytes are
//! written one bit per generation into the middle cell. If the pool ever
//! reaches the all-zero fixed point it is refilled from a [`SeedSource`].
//!
//! This is a cellular-automaton generator, not a CSPRNG. Its output is
//! predictable from the pool state.

pub mod automaton;
pub mod config;
pub mod device;
pub mod error;
pub mod quality;
pub mod ring;
pub mod selftest;
pub mod source;

pub use automaton::{Automaton, EngineStats, INJECT_BIT, bootstrap_pool, rule30};
pub use config::{
    Bootstrap, DEFAULT_BLOCK_SIZE, DEFAULT_RESEED_ATTEMPTS, EngineConfig, MAX_BLOCK_SIZE,
};
pub use device::{Device, DeviceStatus};
pub use error::{Error, Result, SeedError};
pub use quality::{
    BitBias, QualityReport, bit_bias, grade_min_entropy, quick_min_entropy, quick_quality,
    quick_shannon,
};
pub use ring::{BitRing, POOL_BITS, POOL_BYTES, POOL_WORDS};
pub use selftest::{SelfTestCheck, SelfTestReport};
pub use source::{FixedSeed, OsSeed, SeedSource};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
