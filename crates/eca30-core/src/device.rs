//! Byte-stream device over a shared automaton.
//!
//! [`Device`] is the user-space stand-in for a character device: reads are
//! served in fixed-size blocks through a zeroed scratch buffer, writes are
//! injected into the pool. The engine sits behind a mutex that is held for
//! the whole request, so concurrent readers each get a contiguous slice of
//! the stream.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::automaton::{Automaton, EngineStats};
use crate::config::{Bootstrap, EngineConfig};
use crate::error::{Error, Result};
use crate::ring::POOL_BITS;
use crate::source::{OsSeed, SeedSource};

/// Thread-safe Rule 30 byte device.
pub struct Device {
    engine: Mutex<Automaton>,
    block_size: usize,
    writable: bool,
    bootstrap: Bootstrap,
}

impl Device {
    /// Create a device seeded from the operating system.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Self::with_source(config, Box::new(OsSeed))
    }

    /// Create a device with a custom seed source.
    pub fn with_source(config: &EngineConfig, source: Box<dyn SeedSource>) -> Result<Self> {
        let engine = Automaton::with_config(source, config)?;
        Ok(Self::from_engine(engine, config))
    }

    /// Wrap an existing engine. `config` supplies the block size and write
    /// policy.
    pub fn from_engine(engine: Automaton, config: &EngineConfig) -> Self {
        Self {
            engine: Mutex::new(engine),
            block_size: config.block_size.max(1),
            writable: config.writable,
            bootstrap: config.bootstrap,
        }
    }

    /// Bytes extracted per copy.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether writes are accepted.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    // A panic mid-request leaves the pool a valid ring, so a poisoned lock
    // is safe to reuse.
    fn engine(&self) -> MutexGuard<'_, Automaton> {
        self.engine.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy `len` bytes of output into `out`, one block at a time.
    ///
    /// Returns the number of bytes delivered (always `len` on success). If
    /// `out` fails the request stops with [`Error::Transfer`], carrying the
    /// count of bytes `out` accepted before the fault. A reseed failure
    /// mid-request carries the same count in [`Error::EntropyUnavailable`].
    pub fn read_into<W: Write + ?Sized>(&self, out: &mut W, len: usize) -> Result<usize> {
        if len == 0 {
            return Ok(0);
        }
        let mut scratch = vec![0u8; self.block_size.min(len)];
        let mut engine = self.engine();
        let mut delivered = 0;

        while delivered < len {
            let n = (len - delivered).min(self.block_size);
            let block = &mut scratch[..n];
            if let Err(e) = engine.extract_into(block) {
                return Err(e.with_delivered(delivered));
            }
            let copied = copy_block(out, block, &mut delivered);
            block.fill(0);
            if let Err(source) = copied {
                return Err(Error::Transfer { delivered, source });
            }
        }
        Ok(delivered)
    }

    /// Return `len` bytes of output.
    pub fn read(&self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        self.read_into(&mut out, len)?;
        Ok(out)
    }

    /// Inject `data` into the pool. Returns `data.len()`.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        self.engine().inject_bytes(data)?;
        Ok(data.len())
    }

    /// Snapshot of the engine state.
    pub fn status(&self) -> DeviceStatus {
        let engine = self.engine();
        DeviceStatus {
            width_bits: POOL_BITS,
            block_size: self.block_size,
            bootstrap: self.bootstrap.to_string(),
            writable: self.writable,
            source: engine.source_name().to_string(),
            nonzero: engine.is_nonzero(),
            live_cells: engine.pool().count_ones(),
            stats: engine.stats(),
        }
    }
}

/// Write all of `block`, adding each accepted chunk to `delivered` as it
/// lands so a fault mid-block still reports the bytes the caller got.
fn copy_block<W: Write + ?Sized>(
    out: &mut W,
    block: &[u8],
    delivered: &mut usize,
) -> io::Result<()> {
    let mut sent = 0;
    while sent < block.len() {
        match out.write(&block[sent..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole block",
                ));
            }
            Ok(k) => {
                sent += k;
                *delivered += k;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

impl io::Read for &Device {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        match self.read_into(&mut io::Cursor::new(buf), len) {
            Ok(n) => Ok(n),
            // Bytes already placed in `buf` are reported as a short read.
            Err(e) if e.delivered() > 0 => Ok(e.delivered()),
            Err(e) => Err(e.into()),
        }
    }
}

impl io::Write for &Device {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Device::write(*self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Device status for CLI and HTTP reporting.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    /// Ring width in cells.
    pub width_bits: usize,
    /// Bytes extracted per copy.
    pub block_size: usize,
    /// Startup procedure used.
    pub bootstrap: String,
    /// Whether writes are injected.
    pub writable: bool,
    /// Seed source name.
    pub source: String,
    /// Whether the pool currently has a live cell.
    pub nonzero: bool,
    /// Number of live cells.
    pub live_cells: u32,
    /// Engine counters.
    #[serde(flatten)]
    pub stats: EngineStats,
}
