use crate::{raw::RawFuture, result::attempt, ErrorResult, Panicked};
use std::fmt;

/// The write side of a [`Future`](crate::Future).
///
/// Every settling method takes `self`, so a resolver settles its future at
/// most once.
///
/// # Examples
///
/// ```
/// use promise_latch::Future;
/// use futures::executor::block_on;
/// use std::{future::IntoFuture, thread};
/// let (resolver, future) = Future::<String, String>::pending();
///
/// let task = thread::spawn(move || resolver.resolve("Hi".into()));
/// assert_eq!(block_on(future.into_future()), Ok("Hi".to_owned()));
/// task.join().expect("The resolver thread has panicked.");
/// ```
///
/// Settling the same resolver a second time does not compile:
///
/// ```compile_fail
/// use promise_latch::Future;
/// let (resolver, _future) = Future::<u8, String>::pending();
/// resolver.resolve(1);
/// resolver.reject("again".to_owned());
/// ```
pub struct Resolver<T, E> {
    raw: RawFuture<ErrorResult<T, E>>,
}

impl<T, E> Resolver<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn new(raw: RawFuture<ErrorResult<T, E>>) -> Self {
        Self { raw }
    }

    /// Settles the future with an already built result.
    pub fn fulfill(self, result: ErrorResult<T, E>) {
        self.raw.fulfill(result);
    }

    /// Settles the future with a value.
    pub fn resolve(self, value: T) {
        self.fulfill(Ok(value));
    }

    /// Settles the future with an error.
    pub fn reject(self, err: E) {
        self.fulfill(Err(err));
    }

    /// Runs `op` and settles the future with whatever it produces.
    ///
    /// An `Err` returned by `op` rejects the future, and so does a panic
    /// inside `op`, which is captured as [`Panicked`].
    pub fn attempt_resolve<X, F>(self, op: F)
    where
        F: FnOnce() -> Result<T, X>,
        X: Into<E>,
        E: From<Panicked>,
    {
        self.fulfill(attempt(op));
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("raw", &self.raw).finish()
    }
}
