//! Execution contexts decide where a continuation runs.
//!
//! Every combinator takes an `Option<Arc<dyn ExecutionContext>>`. With `None`
//! the continuation runs inline, on whichever thread performs the second of
//! fulfillment and registration. With a context, the continuation is handed
//! to [`ExecutionContext::dispatch_async`] and the calling thread moves on.
//!
use std::{
    any::Any,
    fmt, io,
    panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam_channel::Sender;

/// A unit of work handed to an [`ExecutionContext`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to an execution context, as accepted by the combinators.
pub type Context = Arc<dyn ExecutionContext>;

/// Asynchronous, non-blocking dispatch of callbacks onto some thread or loop.
pub trait ExecutionContext: Send + Sync {
    /// Schedules `job` to run later. Must not wait for `job` to run.
    fn dispatch_async(&self, job: Job);
}

/// Returns a thunk that dispatches `f` onto `context` when called.
pub fn wrap<F>(context: Context, f: F) -> impl FnOnce() + Send + 'static
where
    F: FnOnce() + Send + 'static,
{
    move || {
        log::trace!("dispatching continuation onto execution context");
        context.dispatch_async(Box::new(f))
    }
}

/// Runs `f` inline, or wraps it for `context` when one is given.
pub(crate) fn bind<F>(context: Option<Context>, f: F) -> Box<dyn FnOnce() + Send + 'static>
where
    F: FnOnce() + Send + 'static,
{
    match context {
        Some(context) => Box::new(wrap(context, f)),
        None => Box::new(f),
    }
}

#[cfg(feature = "thread-pool")]
impl ExecutionContext for futures::executor::ThreadPool {
    fn dispatch_async(&self, job: Job) {
        self.spawn_ok(async move { job() });
    }
}

/// A single worker thread that runs dispatched jobs one at a time, in order.
///
/// The queue is unbounded, so dispatching never waits, not even from a job
/// running on the worker itself. A panicking job does not stop the worker;
/// the first panic is kept and forwarded to the thread that drops the queue,
/// after the worker has drained what is already queued.
///
/// # Examples
///
/// ```
/// use promise_latch::{Context, Future, SerialQueue};
/// use std::sync::Arc;
///
/// let queue: Context = Arc::new(SerialQueue::builder().name("main-loop").spawn().unwrap());
/// let (resolver, future) = Future::<u8, ()>::pending();
/// let doubled = future.then_map(Some(queue.clone()), |r| r.map(|v| v * 2));
/// resolver.resolve(21);
/// assert_eq!(futures::executor::block_on(async { doubled.await }), Ok(42));
/// ```
pub struct SerialQueue {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<Option<Box<dyn Any + Send>>>>,
}

/// Configures and spawns a [`SerialQueue`].
#[derive(Debug, Clone, Default)]
pub struct SerialQueueBuilder {
    name: Option<String>,
}

impl SerialQueueBuilder {
    /// Names the worker thread.
    pub fn name<N: Into<String>>(self, name: N) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn spawn(self) -> io::Result<SerialQueue> {
        let (sender, recv) = crossbeam_channel::unbounded::<Job>();
        let mut builder = thread::Builder::new();
        if let Some(name) = self.name.clone() {
            builder = builder.name(name);
        }
        let name = self.name.unwrap_or_else(|| "serial-queue".to_owned());
        let handle = builder.spawn(move || {
            log::trace!("serial queue '{name}' starting");
            let mut first_panic = None;
            for job in recv {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
                    log::trace!("job on serial queue '{name}' panicked");
                    if first_panic.is_none() {
                        first_panic = Some(payload);
                    }
                }
            }
            log::trace!("serial queue '{name}' exiting");
            first_panic
        })?;

        Ok(SerialQueue {
            sender: Some(sender),
            handle: Some(handle),
        })
    }
}

impl SerialQueue {
    pub fn builder() -> SerialQueueBuilder {
        SerialQueueBuilder::default()
    }
}

impl ExecutionContext for SerialQueue {
    fn dispatch_async(&self, job: Job) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(job).is_err() {
            log::trace!("serial queue worker is gone, dropping job");
        }
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker loop end.
        drop(self.sender.take());

        if let Some(handle) = self.handle.take() {
            // The last handle can be released by a job on the worker itself.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            let payload = match handle.join() {
                Ok(first_panic) => first_panic,
                Err(payload) => Some(payload),
            };
            if let Some(payload) = payload {
                if !thread::panicking() {
                    resume_unwind(payload);
                }
            }
        }
    }
}

impl fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialQueue")
            .field(
                "thread",
                &self.handle.as_ref().map(|h| h.thread().name().map(str::to_owned)),
            )
            .finish()
    }
}
