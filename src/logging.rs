//! # Structured logging setup.
//!
//! [`init`] installs a `tracing-subscriber` fmt subscriber filtered by
//! `JOBVISOR_LOG` (default `info`). `WARN` and `ERROR` go to stderr, the rest
//! to stdout. Both streams are wrapped in [`PipeSafe`], so a parent process
//! closing its end of the pipe does not turn logging into an error storm.
//!
//! ```text
//! event ──► EnvFilter ──► level <= WARN ? PipeSafe(stderr) : PipeSafe(stdout)
//!                                              │
//!                                  BrokenPipe ─┴─► latched closed, writes dropped
//!                                  other error ──► returned to the caller
//! ```

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::config::vars;

const DEFAULT_FILTER: &str = "info";

/// Writer that swallows "pipe closed" errors and surfaces every other error.
///
/// After the first `BrokenPipe`, the stream is latched closed: later writes
/// succeed without touching the underlying writer. The latch is shared by
/// every writer created from the same [`PipeSafe::with_latch`] flag.
#[derive(Debug)]
pub struct PipeSafe<W> {
    inner: W,
    closed: Arc<AtomicBool>,
}

impl<W: Write> PipeSafe<W> {
    pub fn new(inner: W) -> Self {
        Self::with_latch(inner, Arc::new(AtomicBool::new(false)))
    }

    pub fn with_latch(inner: W, closed: Arc<AtomicBool>) -> Self {
        Self { inner, closed }
    }

    /// Returns true once the pipe was observed closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    fn absorb<T>(&self, res: io::Result<T>, ok: T) -> io::Result<T> {
        match res {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                self.closed.store(true, Ordering::Relaxed);
                Ok(ok)
            }
            other => other,
        }
    }
}

impl<W: Write> Write for PipeSafe<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Ok(buf.len());
        }
        let res = self.inner.write(buf);
        self.absorb(res, buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        let res = self.inner.flush();
        self.absorb(res, ())
    }
}

/// Installs the global subscriber.
///
/// Fails if a global subscriber is already set (e.g. called twice).
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_env(vars::LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let out_closed = Arc::new(AtomicBool::new(false));
    let err_closed = Arc::new(AtomicBool::new(false));
    let stdout = move || PipeSafe::with_latch(io::stdout(), Arc::clone(&out_closed));
    let stderr = move || PipeSafe::with_latch(io::stderr(), Arc::clone(&err_closed));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(stderr.with_max_level(Level::WARN).or_else(stdout))
        .try_init()
}
