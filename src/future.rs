//! The typed, error-aware future and its combinators.
//!
use crate::{
    context::Context,
    raw::{Next, RawFuture},
    resolver::Resolver,
    ErrorResult, Panicked,
};
use std::{
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
};

/// Observer for the error branch of [`Future::then_split`].
pub type ErrorObserver<E> = Box<dyn FnOnce(&E) + Send + 'static>;

/// What a `then` handler returns: a settled result, or a future to wait on.
pub enum PromiseOrValue<T, E> {
    Value(ErrorResult<T, E>),
    Promise(Future<T, E>),
}

impl<T, E> PromiseOrValue<T, E> {
    pub fn ok(value: T) -> Self {
        Self::Value(Ok(value))
    }

    pub fn err(err: E) -> Self {
        Self::Value(Err(err))
    }

    fn into_next(self) -> Next<ErrorResult<T, E>> {
        match self {
            Self::Value(result) => Next::Value(result),
            Self::Promise(future) => Next::Future(future.raw),
        }
    }
}

impl<T, E> From<ErrorResult<T, E>> for PromiseOrValue<T, E> {
    fn from(result: ErrorResult<T, E>) -> Self {
        Self::Value(result)
    }
}

impl<T, E> From<Future<T, E>> for PromiseOrValue<T, E> {
    fn from(future: Future<T, E>) -> Self {
        Self::Promise(future)
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for PromiseOrValue<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(result) => f.debug_tuple("Value").field(result).finish(),
            Self::Promise(future) => f.debug_tuple("Promise").field(future).finish(),
        }
    }
}

/// A value of type `T`, or an error of type `E`, that arrives at most once.
///
/// A future has exactly one continuation slot. Every combinator consumes the
/// future, registers its continuation and returns a new future right away,
/// without waiting for the value.
///
/// # Examples
///
/// ```
/// use promise_latch::{Future, PromiseOrValue};
/// use futures::executor::block_on;
/// use std::future::IntoFuture;
///
/// let (resolver, future) = Future::<u32, String>::pending();
/// let chained = future
///     .then_map(None, |r| r.map(|v| v + 1))
///     .then(None, |r| match r {
///         Ok(v) => PromiseOrValue::Promise(Future::resolved(v * 10)),
///         Err(e) => PromiseOrValue::err(e),
///     });
/// resolver.resolve(4);
/// assert_eq!(block_on(chained.into_future()), Ok(50));
/// ```
pub struct Future<T, E> {
    pub(crate) raw: RawFuture<ErrorResult<T, E>>,
}

impl<T, E> Future<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// A future already settled with `value`.
    pub fn resolved(value: T) -> Self {
        Self::settled(Ok(value))
    }

    /// A future already settled with `err`.
    pub fn rejected(err: E) -> Self {
        Self::settled(Err(err))
    }

    /// A future already settled with `result`, success or failure.
    pub fn settled(result: ErrorResult<T, E>) -> Self {
        Self {
            raw: RawFuture::fulfilled(result),
        }
    }

    /// A pending future together with the resolver that settles it.
    pub fn pending() -> (Resolver<T, E>, Self) {
        let raw = RawFuture::new();
        (Resolver::new(raw.clone()), Self { raw })
    }

    /// Whether the future has been settled. Does not use up the continuation.
    pub fn is_settled(&self) -> bool {
        self.raw.is_fulfilled()
    }

    /// Monadic bind.
    ///
    /// `handler` receives the settled result, success or failure, and returns
    /// either a result or another future. In the latter case the returned
    /// future settles with that future's result.
    pub fn then<R, F>(self, context: Option<Context>, handler: F) -> Future<R, E>
    where
        R: Send + 'static,
        F: FnOnce(ErrorResult<T, E>) -> PromiseOrValue<R, E> + Send + 'static,
    {
        Future {
            raw: self
                .raw
                .then(context, move |result| handler(result).into_next()),
        }
    }

    /// Ends a chain with a side effect.
    pub fn then_sink<F>(self, context: Option<Context>, handler: F)
    where
        F: FnOnce(ErrorResult<T, E>) + Send + 'static,
    {
        self.raw.then_sink(context, handler);
    }

    /// Synchronous transform of the settled result.
    pub fn then_map<R, F>(self, context: Option<Context>, handler: F) -> Future<R, E>
    where
        R: Send + 'static,
        F: FnOnce(ErrorResult<T, E>) -> ErrorResult<R, E> + Send + 'static,
    {
        self.then(context, move |result| PromiseOrValue::Value(handler(result)))
    }

    /// Routes success to `on_success` and failure to `on_error`.
    ///
    /// `on_error` only observes the error; the returned future is rejected
    /// with the same error either way.
    pub fn then_split<R, F>(
        self,
        context: Option<Context>,
        on_error: Option<ErrorObserver<E>>,
        on_success: F,
    ) -> Future<R, E>
    where
        R: Send + 'static,
        F: FnOnce(T) -> PromiseOrValue<R, E> + Send + 'static,
    {
        self.then(context, move |result| match result {
            Ok(value) => on_success(value),
            Err(err) => {
                if let Some(on_error) = on_error {
                    on_error(&err);
                }
                PromiseOrValue::err(err)
            }
        })
    }

    /// Runs a handler that may fail with `?` or panic.
    ///
    /// Whatever goes wrong inside `handler` rejects the returned future
    /// instead of escaping to the thread that ran it.
    ///
    /// ```
    /// use promise_latch::{Future, Panicked};
    /// use futures::executor::block_on;
    /// use std::future::IntoFuture;
    ///
    /// #[derive(Debug, PartialEq)]
    /// enum Error { Odd(u32), Panic }
    /// impl From<Panicked> for Error {
    ///     fn from(_: Panicked) -> Self { Error::Panic }
    /// }
    ///
    /// let halved = Future::<u32, Error>::resolved(7).then_checked(None, |r| {
    ///     let v = r?;
    ///     if v % 2 == 1 {
    ///         return Err(Error::Odd(v));
    ///     }
    ///     Ok(v / 2)
    /// });
    /// assert_eq!(block_on(halved.into_future()), Err(Error::Odd(7)));
    /// ```
    pub fn then_checked<R, X, F>(self, context: Option<Context>, handler: F) -> Future<R, E>
    where
        R: Send + 'static,
        X: Into<E>,
        F: FnOnce(ErrorResult<T, E>) -> Result<R, X> + Send + 'static,
        E: From<Panicked>,
    {
        self.then_map(context, move |result| {
            match catch_unwind(AssertUnwindSafe(move || handler(result))) {
                Ok(outcome) => outcome.map_err(Into::into),
                Err(payload) => Err(Panicked::from_payload(payload).into()),
            }
        })
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future").field("raw", &self.raw).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Future, PromiseOrValue};
    use crate::Panicked;
    use std::sync::{mpsc, Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    enum Error {
        #[error("bad input: {0}")]
        Bad(u32),
        #[error(transparent)]
        Panicked(#[from] Panicked),
    }

    fn collect<T: Send + 'static>(future: Future<T, Error>) -> mpsc::Receiver<Result<T, Error>> {
        let (tx, rx) = mpsc::channel();
        future.then_sink(None, move |r| tx.send(r).unwrap());
        rx
    }

    #[test]
    fn test_resolved_settles_inline() {
        let rx = collect(Future::<_, Error>::resolved(9));
        assert_eq!(rx.try_recv(), Ok(Ok(9)));
    }

    #[test]
    fn test_rejected_settles_inline() {
        let rx = collect(Future::<u8, _>::rejected(Error::Bad(1)));
        assert_eq!(rx.try_recv(), Ok(Err(Error::Bad(1))));
    }

    #[test]
    fn test_then_sees_errors() {
        let future = Future::<u8, _>::rejected(Error::Bad(2)).then(None, |r| match r {
            Ok(_) => PromiseOrValue::ok("ok"),
            Err(Error::Bad(n)) => PromiseOrValue::ok(if n == 2 { "recovered" } else { "other" }),
            Err(e) => PromiseOrValue::err(e),
        });
        assert_eq!(collect(future).try_recv(), Ok(Ok("recovered")));
    }

    #[test]
    fn test_then_flattens_pending_future() {
        let (outer, source) = Future::<u8, Error>::pending();
        let (inner, sub) = Future::<u8, Error>::pending();
        let rx = collect(source.then(None, move |_| PromiseOrValue::Promise(sub)));

        outer.resolve(1);
        assert!(rx.try_recv().is_err());
        inner.resolve(2);
        assert_eq!(rx.try_recv(), Ok(Ok(2)));
    }

    #[test]
    fn test_then_split_observes_error_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observed = seen.clone();
        let future = Future::<u8, _>::rejected(Error::Bad(3)).then_split(
            None,
            Some(Box::new(move |e: &Error| observed.lock().unwrap().push(e.clone()))),
            |v| PromiseOrValue::ok(v + 1),
        );
        assert_eq!(collect(future).try_recv(), Ok(Err(Error::Bad(3))));
        assert_eq!(*seen.lock().unwrap(), vec![Error::Bad(3)]);
    }

    #[test]
    fn test_then_split_success_skips_observer() {
        let future = Future::<u8, Error>::resolved(4).then_split(
            None,
            Some(Box::new(|_: &Error| panic!("observer called on success"))),
            |v| PromiseOrValue::ok(v * 2),
        );
        assert_eq!(collect(future).try_recv(), Ok(Ok(8)));
    }

    #[test]
    fn test_then_checked_short_circuits() {
        let future = Future::<u32, _>::rejected(Error::Bad(5)).then_checked(None, |r| {
            let v = r?;
            Ok::<_, Error>(v + 1)
        });
        assert_eq!(collect(future).try_recv(), Ok(Err(Error::Bad(5))));
    }

    #[test]
    fn test_then_checked_captures_panic() {
        let future = Future::<u32, Error>::resolved(1)
            .then_checked(None, |_| -> Result<u32, Error> { panic!("handler blew up") });
        let result = collect(future).try_recv().unwrap();
        match result {
            Err(Error::Panicked(p)) => assert_eq!(p.message(), "handler blew up"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_is_settled() {
        let (resolver, future) = Future::<(), Error>::pending();
        assert!(!future.is_settled());
        resolver.reject(Error::Bad(0));
        assert!(future.is_settled());
    }
}
