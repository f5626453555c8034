use crate::cmd::zset::SortedCmd;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;

/// Shared state of one submitted request. The executor and the caller race
/// on it with compare-and-swap, so exactly one of "started" and
/// "cancelled" wins.
#[derive(Debug, Default)]
pub struct Ticket(AtomicU8);

impl Ticket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Called by the executor right before applying. False means the
    /// request was cancelled and must be skipped.
    pub fn start(&self) -> bool {
        self.0
            .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called by the caller. False means the request already started (or
    /// was already cancelled) and the call is a no-op.
    pub fn cancel(&self) -> bool {
        self.0
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire) == CANCELLED
    }
}

/// A sorted set command on its way to an executor.
#[derive(Debug)]
pub struct Request {
    pub cmd: SortedCmd,
    pub ticket: Arc<Ticket>,
}

impl Request {
    pub fn new(cmd: SortedCmd) -> Self {
        Self {
            cmd,
            ticket: Ticket::new(),
        }
    }
}
