//! One debounce lane.
//!
//! State per channel:
//! - `pending`: the single remembered command (stack of one, last writer wins);
//! - `gate`: a one-permit semaphore held for `delay` from the moment a slot
//!   opens, independent of how long the body runs;
//! - `epoch`: bumped on every submit and flush. A waiter that sees the epoch
//!   move stops waiting for the gate. A running body is never interrupted.
//!
//! `exec` serialises bodies, so a body that outlives its window delays the
//! next one instead of running beside it.

use crate::command::{Command, CommandResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinError;

/// Cumulative per-channel counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub submitted: u64,
    /// Bodies started (including ones that later failed).
    pub executed: u64,
    /// Bodies that returned `Err` or panicked.
    pub failed: u64,
    /// Slot waits abandoned because a newer submit or a flush arrived.
    pub cancelled: u64,
    /// Pending commands replaced before they started.
    pub superseded: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    superseded: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ChannelStats {
        ChannelStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
        }
    }
}

struct Inner {
    name: &'static str,
    delay: Duration,
    pending: Mutex<Option<Command>>,
    gate: Arc<Semaphore>,
    epoch: watch::Sender<u64>,
    exec: tokio::sync::Mutex<()>,
    counters: Counters,
    handle: Handle,
}

/// Cheap to clone; clones share the same lane.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("delay", &self.inner.delay)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Channel {
    /// Create a channel on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self::with_handle(name, delay, Handle::current())
    }

    pub fn with_handle(name: &'static str, delay: Duration, handle: Handle) -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                name,
                delay,
                pending: Mutex::new(None),
                gate: Arc::new(Semaphore::new(1)),
                epoch,
                exec: tokio::sync::Mutex::new(()),
                counters: Counters::default(),
                handle,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    pub fn stats(&self) -> ChannelStats {
        self.inner.counters.snapshot()
    }

    /// `true` when no command is waiting to run.
    pub fn is_idle(&self) -> bool {
        self.inner.lock_pending().is_none()
    }

    /// Make `command` the pending command and schedule a slot wait for it.
    /// Any earlier pending command is dropped; any earlier slot wait is cancelled.
    pub fn submit(&self, command: Command) {
        let inner = &self.inner;
        Counters::bump(&inner.counters.submitted);
        inner.epoch.send_modify(|e| *e = e.wrapping_add(1));

        if inner.lock_pending().replace(command).is_some() {
            Counters::bump(&inner.counters.superseded);
        }

        let mut epoch = inner.epoch.subscribe();
        let this = Arc::clone(inner);
        inner.handle.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = epoch.changed() => {
                    Counters::bump(&this.counters.cancelled);
                    log::trace!("{}: slot wait cancelled", this.name);
                    return;
                }
                permit = Arc::clone(&this.gate).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            // The window runs from slot opening, not from body completion.
            let delay = this.delay;
            this.handle.spawn(async move {
                tokio::time::sleep(delay).await;
                drop(permit);
            });

            log::trace!("{}: slot opened", this.name);
            this.run_pending().await;
        });
    }

    /// Run the pending command now, skipping the delay, and wait for it.
    /// Returns `false` if nothing was pending. The channel is idle afterward.
    pub async fn flush(&self) -> bool {
        self.inner.epoch.send_modify(|e| *e = e.wrapping_add(1));
        self.inner.run_pending().await
    }
}

impl Inner {
    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<Command>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take whatever is pending *now* and run it to completion.
    async fn run_pending(&self) -> bool {
        let _running = self.exec.lock().await;
        let pending = self.lock_pending().take();
        let Some(command) = pending else {
            return false;
        };
        Counters::bump(&self.counters.executed);
        let outcome = self.handle.spawn(command.into_future()).await;
        self.report(outcome);
        true
    }

    fn report(&self, outcome: Result<CommandResult, JoinError>) {
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                Counters::bump(&self.counters.failed);
                log::warn!("{}: command failed: {e}", self.name);
            }
            Err(e) if e.is_panic() => {
                Counters::bump(&self.counters.failed);
                log::error!("{}: command panicked", self.name);
            }
            Err(e) => {
                Counters::bump(&self.counters.failed);
                log::warn!("{}: command aborted: {e}", self.name);
            }
        }
    }
}
