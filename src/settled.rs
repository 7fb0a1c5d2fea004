//! Awaiting a [`Future`](crate::Future) from async code.
//!
use crate::{ErrorResult, Future};
use std::{
    future::{Future as StdFuture, IntoFuture},
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll, Waker},
};

/// The `std::future::Future` returned by `Future::into_future`.
///
/// Converting registers the future's single continuation, so a future that
/// is awaited cannot be chained any further.
///
/// # Examples
///
/// ```
/// use promise_latch::Future;
/// use futures::executor::block_on;
/// use std::thread;
/// let (resolver, future) = Future::<String, ()>::pending();
///
/// let task1 = thread::spawn(move || block_on(async {
///     future.await
/// }));
/// resolver.resolve("🍓".into());
/// assert_eq!(task1.join().expect("The task1 thread has panicked."), Ok("🍓".to_owned()));
/// ```
#[derive(Debug)]
pub struct Settled<T, E> {
    inner: Arc<Mutex<Inner<T, E>>>,
}

#[derive(Debug)]
struct Inner<T, E> {
    value: Option<ErrorResult<T, E>>,
    waker: Option<Waker>,
    taken: bool,
}

impl<T, E> IntoFuture for Future<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = ErrorResult<T, E>;
    type IntoFuture = Settled<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        let inner = Arc::new(Mutex::new(Inner {
            value: None,
            waker: None,
            taken: false,
        }));
        let shared = inner.clone();
        self.then_sink(None, move |result| {
            let mut inner = lock(&shared);
            inner.value = Some(result);
            if let Some(waker) = inner.waker.take() {
                drop(inner);
                waker.wake();
            }
        });
        Settled { inner }
    }
}

impl<T, E> StdFuture for Settled<T, E> {
    type Output = ErrorResult<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = lock(&self.inner);
        match inner.value.take() {
            Some(value) => {
                inner.taken = true;
                Poll::Ready(value)
            }
            None if inner.taken => panic!("`Settled` polled after completion"),
            None => {
                inner.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

// A poisoned lock only means a waker panicked; the slot itself is intact.
fn lock<T, E>(inner: &Mutex<Inner<T, E>>) -> std::sync::MutexGuard<'_, Inner<T, E>> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use crate::Future;
    use futures::executor::block_on;
    use std::{future::IntoFuture, thread};

    #[test]
    fn test_await_resolved() {
        assert_eq!(block_on(Future::<u8, ()>::resolved(1).into_future()), Ok(1));
    }

    #[test]
    fn test_await_rejected() {
        let (a, b) = Future::<String, String>::pending();
        let task1 = thread::spawn(|| block_on(async { b.await }));
        let task2 = thread::spawn(|| a.reject(String::from("reject!!")));
        task2.join().expect("The task2 thread has panicked");
        assert_eq!(
            task1.join().expect("The task1 thread has panicked"),
            Err("reject!!".to_owned())
        );
    }

    #[test]
    fn test_await_resolved_later() {
        let (op, op_a) = Future::<String, ()>::pending();
        let task1 = thread::spawn(move || block_on(async { op_a.await.unwrap() }));
        let task2 = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(50));
            op.resolve(String::from("🍓"));
        });
        task2.join().expect("The task2 thread has panicked");
        assert_eq!(task1.join().expect("The task1 thread has panicked"), "🍓");
    }
}
