use crate::channel::Channel;
use crate::command::Command;
use std::time::Duration;
use tokio::runtime::Handle;

/// Delays for the two canvas channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub redraw_delay: Duration,
    pub pointer_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_millis(16, 64)
    }
}

impl SchedulerConfig {
    pub fn from_millis(redraw_ms: u64, pointer_ms: u64) -> Self {
        Self {
            redraw_delay: Duration::from_millis(redraw_ms),
            pointer_delay: Duration::from_millis(pointer_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Coarse lane for repaint requests.
    Redraw,
    /// Fine lane for coalesced pointer-move handling.
    Pointer,
}

/// The redraw and pointer channels of one canvas.
#[derive(Debug, Clone)]
pub struct Scheduler {
    redraw: Channel,
    pointer: Channel,
}

impl Scheduler {
    /// Build on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`Scheduler::with_handle`] to pass one explicitly.
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_handle(config, Handle::current())
    }

    pub fn with_handle(config: SchedulerConfig, handle: Handle) -> Self {
        Self {
            redraw: Channel::with_handle("redraw", config.redraw_delay, handle.clone()),
            pointer: Channel::with_handle("pointer", config.pointer_delay, handle),
        }
    }

    pub fn channel(&self, kind: ChannelKind) -> &Channel {
        match kind {
            ChannelKind::Redraw => &self.redraw,
            ChannelKind::Pointer => &self.pointer,
        }
    }

    pub fn redraw(&self) -> &Channel {
        &self.redraw
    }

    pub fn pointer(&self) -> &Channel {
        &self.pointer
    }

    pub fn submit(&self, kind: ChannelKind, command: Command) {
        self.channel(kind).submit(command);
    }

    pub async fn flush(&self, kind: ChannelKind) -> bool {
        self.channel(kind).flush().await
    }
}
