//! The untyped one-shot future that everything else is built on.
//!
//! A [`RawFuture`] owns a write-once value slot and a [`Latch`] of two. The
//! producer calls [`RawFuture::fulfill`], the consumer calls
//! [`RawFuture::then_sink`] (or [`RawFuture::then`]); whichever comes second
//! runs the continuation. No locks are taken and neither side ever blocks.
//!
use crate::{
    context::{bind, Context},
    latch::Latch,
};
use std::{
    cell::UnsafeCell,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering::AcqRel, Ordering::Acquire},
        Arc,
    },
};

/// What a chaining handler hands back: a value now, or a future to wait on.
#[derive(Debug)]
pub enum Next<T> {
    Value(T),
    Future(RawFuture<T>),
}

struct Inner<T> {
    value: UnsafeCell<Option<T>>,
    fulfilled: AtomicBool,
    registered: AtomicBool,
    latch: Latch,
}

// The value cell is written once by the fulfilling thread before its latch
// decrement and read once by the action, which only runs after both decrements.
unsafe impl<T: Send> Send for Inner<T> {}
unsafe impl<T: Send> Sync for Inner<T> {}

/// A handle to a one-shot value holder.
///
/// Handles are cheap to clone and all refer to the same slot. At most one
/// [`fulfill`](Self::fulfill) and one continuation registration are allowed
/// across all clones; a second one of either panics.
pub struct RawFuture<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RawFuture<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> Default for RawFuture<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> RawFuture<T> {
    /// Creates a pending future.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                value: UnsafeCell::new(None),
                fulfilled: AtomicBool::new(false),
                registered: AtomicBool::new(false),
                latch: Latch::new(2),
            }),
        }
    }

    /// Creates a future that already holds `value`.
    pub fn fulfilled(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: UnsafeCell::new(Some(value)),
                fulfilled: AtomicBool::new(true),
                registered: AtomicBool::new(false),
                latch: Latch::new(1),
            }),
        }
    }

    /// Supplies the value.
    ///
    /// # Panics
    ///
    /// Panics if the future already holds a value.
    pub fn fulfill(&self, value: T) {
        if self.inner.fulfilled.swap(true, AcqRel) {
            panic!("future is already fulfilled");
        }
        // SAFETY: winning the swap above makes this the only writer, and the
        // continuation cannot read the cell before the decrement below.
        unsafe { *self.inner.value.get() = Some(value) };
        log::trace!("raw future fulfilled");
        self.inner.latch.decrement();
    }

    /// Registers the terminal continuation.
    ///
    /// `handler` runs exactly once, after the value is supplied: inline on the
    /// thread that completes the pair, or dispatched on `context`.
    ///
    /// # Panics
    ///
    /// Panics if a continuation is already registered.
    pub fn then_sink<F>(&self, context: Option<Context>, handler: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        if self.inner.registered.swap(true, AcqRel) {
            panic!("future already has a continuation");
        }
        let inner = self.inner.clone();
        let action = bind(context, move || {
            // SAFETY: the latch only fires after `fulfill` decremented it, and
            // it fires once, so this is the single reader of the cell.
            let value = unsafe { (*inner.value.get()).take() };
            match value {
                Some(value) => handler(value),
                None => panic!("continuation ran before the future was fulfilled"),
            }
        });
        self.inner.latch.set_action(action);
        log::trace!("raw future continuation registered");
        self.inner.latch.decrement();
    }

    /// Chains a handler and returns a future of its outcome.
    ///
    /// If `handler` returns [`Next::Future`], the returned future is settled
    /// with that sub-future's value once it arrives (one level of flattening).
    pub fn then<R, F>(&self, context: Option<Context>, handler: F) -> RawFuture<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> Next<R> + Send + 'static,
    {
        let next = RawFuture::new();
        let out = next.clone();
        self.then_sink(context, move |value| match handler(value) {
            Next::Value(value) => out.fulfill(value),
            Next::Future(sub) => sub.then_sink(None, move |value| out.fulfill(value)),
        });
        next
    }

    pub fn is_fulfilled(&self) -> bool {
        self.inner.fulfilled.load(Acquire)
    }

    pub fn is_registered(&self) -> bool {
        self.inner.registered.load(Acquire)
    }
}

impl<T> fmt::Debug for RawFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFuture")
            .field("fulfilled", &self.inner.fulfilled.load(Acquire))
            .field("registered", &self.inner.registered.load(Acquire))
            .field("latch", &self.inner.latch)
            .finish()
    }
}
