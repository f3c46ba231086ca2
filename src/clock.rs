// Environment tick source

use crate::ledger::types::Tick;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic tick counter standing in for the environment's block height.
///
/// The ledger never reads the clock; the caller environment samples it and
/// passes the tick into each operation. Every admitted mutating call advances
/// the height by one before sampling, the way mining a transaction advances
/// the chain, so a session ended `n` ticks after it started has duration
/// `n + 1`.
#[derive(Debug, Default)]
pub struct BlockClock {
    height: AtomicU64,
}

impl BlockClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Current height, without advancing.
    pub fn height(&self) -> Tick {
        self.height.load(Ordering::SeqCst)
    }

    /// Advance by `n` ticks and return the new height.
    pub fn advance(&self, n: u64) -> Tick {
        self.height.fetch_add(n, Ordering::SeqCst) + n
    }

    /// Advance by one tick and return the new height.
    pub fn tick(&self) -> Tick {
        self.advance(1)
    }
}
