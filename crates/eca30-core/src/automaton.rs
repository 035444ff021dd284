//! The Rule 30 automaton engine.
//!
//! Architecture:
//! 1. The pool is a [`BitRing`] of 257 cells
//! 2. One generation applies `next = left XOR (self OR right)` to every cell
//!    at once, using two rotated copies of the ring
//! 3. Output bits are read from cell 0, one generation per bit
//! 4. Input bits are written into cell [`INJECT_BIT`], one generation per bit
//! 5. After every generation the pool is checked; an all-zero pool (a fixed
//!    point of Rule 30) is refilled from the seed source before anything
//!    else can read it
//!
//! The engine is a single-owner value. Callers sharing it across threads must
//! serialize access themselves; [`Device`](crate::device::Device) does this
//! with a mutex held per request.

use std::fmt;

use rand::TryRngCore;
use serde::Serialize;

use crate::config::{Bootstrap, EngineConfig};
use crate::error::{Error, Result};
use crate::ring::{BitRing, POOL_BITS, POOL_BYTES};
use crate::source::SeedSource;

/// Cell overwritten by each injected input bit (the ring midpoint).
pub const INJECT_BIT: usize = POOL_BITS / 2;

/// One Rule 30 generation of `pool`.
pub fn rule30(pool: &BitRing) -> BitRing {
    let right = pool.rotate_right();
    let left = pool.rotate_left();
    left ^ (*pool | right)
}

/// The deterministic bootstrap state: cell 0 set, then one generation per
/// cell of the ring.
pub fn bootstrap_pool() -> BitRing {
    let mut pool = BitRing::with_bit(0);
    for _ in 0..POOL_BITS {
        pool = rule30(&pool);
    }
    pool
}

/// Running counters. They never feed back into the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Generations computed since construction (bootstrap excluded).
    pub steps: u64,
    /// Successful refills from the seed source.
    pub reseeds: u64,
    /// Bytes produced by extraction.
    pub bytes_out: u64,
    /// Bytes consumed by injection.
    pub bytes_in: u64,
}

/// Rule 30 byte generator owning its pool and seed source.
pub struct Automaton {
    pool: BitRing,
    source: Box<dyn SeedSource>,
    reseed_attempts: u32,
    stats: EngineStats,
}

impl Automaton {
    /// Create an engine and bootstrap its pool.
    pub fn new(source: Box<dyn SeedSource>, bootstrap: Bootstrap) -> Result<Self> {
        Self::with_config(source, &EngineConfig {
            bootstrap,
            ..Default::default()
        })
    }

    /// Create an engine from a full config.
    pub fn with_config(source: Box<dyn SeedSource>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Self {
            pool: BitRing::zeroed(),
            source,
            reseed_attempts: config.reseed_attempts,
            stats: EngineStats::default(),
        };
        match config.bootstrap {
            Bootstrap::Rule30 => engine.pool = bootstrap_pool(),
            Bootstrap::Entropy => {
                log::info!("seeding pool from {}", engine.source.name());
                engine.fill_from_source()?;
            }
        }
        log::debug!(
            "automaton bootstrapped ({}, {} live cells of {POOL_BITS})",
            config.bootstrap,
            engine.pool.count_ones()
        );
        Ok(engine)
    }

    /// Create an engine with an explicit starting pool. A zero pool is
    /// refilled before the first extraction.
    pub fn from_pool(pool: BitRing, source: Box<dyn SeedSource>) -> Self {
        Self {
            pool,
            source,
            reseed_attempts: EngineConfig::default().reseed_attempts,
            stats: EngineStats::default(),
        }
    }

    /// Current pool.
    pub fn pool(&self) -> &BitRing {
        &self.pool
    }

    /// Counters since construction.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Name of the seed source.
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// `true` iff any cell of the pool is set.
    pub fn is_nonzero(&self) -> bool {
        self.pool.is_nonzero()
    }

    /// Apply one generation without the exhaustion check.
    pub fn step(&mut self) {
        self.pool = rule30(&self.pool);
        self.stats.steps += 1;
    }

    /// Apply one generation; refill the pool if it became all zero.
    ///
    /// On return the pool is nonzero, or the refill failed and the error is
    /// returned.
    pub fn advance(&mut self) -> Result<()> {
        self.step();
        if !self.pool.is_nonzero() {
            log::info!("pool drained, refilling from {}", self.source.name());
            self.reseed()?;
        }
        Ok(())
    }

    /// Replace every cell with fresh bytes from the seed source and count
    /// the refill in [`EngineStats::reseeds`].
    ///
    /// A source that errors or keeps yielding an all-zero pool is retried up
    /// to the configured attempt count, then reported as
    /// [`Error::EntropyUnavailable`]. The pool is left untouched on failure.
    pub fn reseed(&mut self) -> Result<()> {
        self.fill_from_source()?;
        self.stats.reseeds += 1;
        Ok(())
    }

    // Uncounted fill shared by reseed and the entropy bootstrap.
    fn fill_from_source(&mut self) -> Result<()> {
        let mut seed = [0u8; POOL_BYTES];
        let mut reason = String::from("seed source returned an all-zero pool");
        for attempt in 1..=self.reseed_attempts {
            match self.source.fill_random(&mut seed) {
                Ok(()) => {
                    let pool = BitRing::from_le_bytes(&seed);
                    seed.fill(0);
                    if pool.is_nonzero() {
                        self.pool = pool;
                        return Ok(());
                    }
                    log::warn!(
                        "reseed attempt {attempt}/{} from {}: all-zero pool",
                        self.reseed_attempts,
                        self.source.name()
                    );
                }
                Err(e) => {
                    log::warn!(
                        "reseed attempt {attempt}/{} from {} failed: {e}",
                        self.reseed_attempts,
                        self.source.name()
                    );
                    reason = e.to_string();
                }
            }
        }
        Err(Error::EntropyUnavailable {
            attempts: self.reseed_attempts,
            reason,
            delivered: 0,
        })
    }

    /// Fill `buf` with output, one generation per bit.
    ///
    /// The buffer is cleared first; bit `i` of the request lands in bit
    /// `i % 8` of byte `i / 8`. An empty buffer is a no-op.
    pub fn extract_into(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        buf.fill(0);
        if !self.pool.is_nonzero() {
            log::info!("pool drained, refilling from {}", self.source.name());
            self.reseed()?;
        }
        for byte in buf.iter_mut() {
            for bit in 0..8 {
                if self.pool.lowest_bit() {
                    *byte |= 1 << bit;
                }
                self.advance()?;
            }
        }
        self.stats.bytes_out += buf.len() as u64;
        Ok(())
    }

    /// Return `n` bytes of output.
    pub fn extract_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; n];
        self.extract_into(&mut out)?;
        Ok(out)
    }

    /// Mix one byte into the pool, least significant bit first.
    pub fn inject(&mut self, byte: u8) -> Result<()> {
        for bit in 0..8 {
            self.pool.set_bit(INJECT_BIT, (byte >> bit) & 1 == 1);
            self.advance()?;
        }
        self.stats.bytes_in += 1;
        Ok(())
    }

    /// Mix every byte of `data` into the pool, in order.
    pub fn inject_bytes(&mut self, data: &[u8]) -> Result<()> {
        data.iter().try_for_each(|&b| self.inject(b))
    }
}

impl fmt::Debug for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Automaton")
            .field("pool", &self.pool)
            .field("source", &self.source.name())
            .field("reseed_attempts", &self.reseed_attempts)
            .field("stats", &self.stats)
            .finish()
    }
}

impl TryRngCore for Automaton {
    type Error = Error;

    fn try_next_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.extract_into(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    fn try_next_u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.extract_into(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        self.extract_into(dst)
    }
}
