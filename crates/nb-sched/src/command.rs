use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Outcome of a command body. Errors are logged by the channel, never re-raised.
pub type CommandResult = Result<(), String>;

type BoxFuture = Pin<Box<dyn Future<Output = CommandResult> + Send + 'static>>;

/// A unit of deferred work. The body is not started until a channel admits it.
pub struct Command {
    run: Box<dyn FnOnce() -> BoxFuture + Send + 'static>,
}

impl Command {
    /// Wrap an async body.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CommandResult> + Send + 'static,
    {
        Self {
            run: Box::new(move || Box::pin(f())),
        }
    }

    /// Wrap a synchronous body.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> CommandResult + Send + 'static,
    {
        Self::new(move || async move { f() })
    }

    pub(crate) fn into_future(self) -> BoxFuture {
        (self.run)()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").finish_non_exhaustive()
    }
}
