//! Cooperative cancellation and host yield points for generation runs.
//! Runs are synchronous; a host that needs to interleave frame work installs a
//! [`Checkpoint`] and gets called back at every yield point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Shared cancellation flag. Clones observe the same signal.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("generation cancelled")]
pub struct Cancelled;

/// Host hook invoked at yield points. `step` counts yields within the run.
pub trait Checkpoint {
    fn yield_now(&mut self, step: u64);
}

impl<F: FnMut(u64)> Checkpoint for F {
    fn yield_now(&mut self, step: u64) {
        self(step);
    }
}

pub struct RunControl<'a> {
    token: CancellationToken,
    checkpoint: Option<Box<dyn Checkpoint + 'a>>,
    yields: u64,
}

impl<'a> RunControl<'a> {
    pub fn new(token: CancellationToken) -> Self {
        Self { token, checkpoint: None, yields: 0 }
    }

    pub fn with_checkpoint(mut self, checkpoint: impl Checkpoint + 'a) -> Self {
        self.checkpoint = Some(Box::new(checkpoint));
        self
    }

    pub fn yields(&self) -> u64 {
        self.yields
    }

    pub fn poll(&self) -> Result<(), Cancelled> {
        if self.token.is_cancelled() { Err(Cancelled) } else { Ok(()) }
    }

    /// Hands control to the host, then re-checks cancellation.
    pub fn yield_point(&mut self) -> Result<(), Cancelled> {
        self.poll()?;
        self.yields += 1;
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            checkpoint.yield_now(self.yields);
        }
        self.poll()
    }
}

impl Default for RunControl<'_> {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
