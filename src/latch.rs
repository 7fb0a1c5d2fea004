//! A one-shot countdown trigger.
//!
//! A [`Latch`] starts at some count and runs a single action when the count
//! reaches zero. [`RawFuture`](crate::raw::RawFuture) uses a latch of two: one
//! decrement for "the value has been supplied" and one for "a continuation has
//! been registered". Whichever happens second runs the continuation.
//!
use std::{
    cell::UnsafeCell,
    fmt,
    sync::atomic::{
        AtomicBool, AtomicIsize, AtomicU8,
        Ordering::{AcqRel, Acquire, Release},
    },
};

/// The action a latch runs once its count reaches zero.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const READY: u8 = 2;
const TAKEN: u8 = 3;

/// One-shot countdown trigger.
///
/// # Examples
///
/// ```
/// use promise_latch::Latch;
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let latch = Latch::new(2);
/// let counter = hits.clone();
/// latch.set_action(move || { counter.fetch_add(1, Ordering::SeqCst); });
/// latch.decrement();
/// assert_eq!(hits.load(Ordering::SeqCst), 0);
/// latch.decrement();
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub struct Latch {
    count: AtomicIsize,
    allows_negative: bool,
    fired: AtomicBool,
    slot: AtomicU8,
    action: UnsafeCell<Option<Action>>,
}

// The action cell is only written by the thread that moved `slot` from EMPTY
// to WRITING, and only read by the thread that moved it from READY to TAKEN.
unsafe impl Send for Latch {}
unsafe impl Sync for Latch {}

impl Latch {
    /// Creates a latch that panics when decremented past zero.
    pub fn new(count: isize) -> Self {
        Self::build(count, false)
    }

    /// Creates a latch where decrements past zero are ignored.
    pub fn with_negative(count: isize) -> Self {
        Self::build(count, true)
    }

    fn build(count: isize, allows_negative: bool) -> Self {
        assert!(count > 0, "latch count must be positive, got {count}");
        Self {
            count: AtomicIsize::new(count),
            allows_negative,
            fired: AtomicBool::new(false),
            slot: AtomicU8::new(EMPTY),
            action: UnsafeCell::new(None),
        }
    }

    /// Installs the action to run when the count reaches zero.
    ///
    /// The action must be installed before the decrement that brings the
    /// count to zero. Installing a second action panics.
    pub fn set_action<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self
            .slot
            .compare_exchange(EMPTY, WRITING, Acquire, Acquire)
            .is_err()
        {
            panic!("latch action is already set");
        }
        // SAFETY: the successful EMPTY -> WRITING exchange grants exclusive
        // access to the cell until READY is published.
        unsafe { *self.action.get() = Some(Box::new(action)) };
        self.slot.store(READY, Release);
    }

    /// Counts down once, running the action if this was the final decrement.
    pub fn decrement(&self) {
        let remaining = self.count.fetch_sub(1, AcqRel) - 1;
        if remaining > 0 {
            return;
        }
        if remaining < 0 {
            if !self.allows_negative {
                panic!("latch decremented past zero");
            }
            log::trace!("latch already at zero, ignoring decrement");
            return;
        }
        if self.fired.swap(true, AcqRel) {
            return;
        }
        log::trace!("latch reached zero, firing");
        self.take_action()();
    }

    fn take_action(&self) -> Action {
        match self.slot.swap(TAKEN, AcqRel) {
            // SAFETY: READY means the writer has finished and released the
            // cell; swapping to TAKEN makes this the only reader.
            READY => match unsafe { (*self.action.get()).take() } {
                Some(action) => action,
                None => unreachable!("latch slot marked ready without an action"),
            },
            EMPTY => panic!("latch reached zero before an action was set"),
            WRITING => panic!("latch reached zero while its action was being set"),
            _ => unreachable!("latch action taken twice"),
        }
    }

    /// Returns the current count. Negative only in allows-negative mode.
    pub fn count(&self) -> isize {
        self.count.load(Acquire)
    }

    /// Whether the action has run (or is running).
    pub fn is_fired(&self) -> bool {
        self.fired.load(Acquire)
    }
}

impl fmt::Debug for Latch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Latch")
            .field("count", &self.count())
            .field("allows_negative", &self.allows_negative)
            .field("fired", &self.is_fired())
            .finish()
    }
}
