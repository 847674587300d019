//! Request coalescing for bursty asynchronous work.
//!
//! A [`Channel`] rate-limits and deduplicates commands: bursts collapse to
//! one trailing execution of the newest command, execution starts are at
//! least one delay apart, and bodies never overlap. A [`Scheduler`] bundles
//! the two channels a canvas needs (redraw and pointer).

pub mod channel;
pub mod command;
pub mod scheduler;

pub use channel::{Channel, ChannelStats};
pub use command::{Command, CommandResult};
pub use scheduler::{ChannelKind, Scheduler, SchedulerConfig};
