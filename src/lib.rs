//! One-shot promises built on a lock-free latch.
//!
//! A producer gets a [`Resolver`] and a consumer gets a [`Future`] from
//! [`Future::pending`]. The producer settles the future exactly once; the
//! consumer registers exactly one continuation with one of the `then`
//! combinators. Whichever of the two happens second runs the continuation,
//! either inline or on an [`ExecutionContext`]. Nothing blocks.
//!
//! # Examples
//!
//! ```
//! use promise_latch::{Future, PromiseOrValue};
//! use std::sync::mpsc;
//!
//! let (resolver, future) = Future::<i32, String>::pending();
//! let (tx, rx) = mpsc::channel();
//! future
//!     .then_split(None, None, |v| PromiseOrValue::ok(v * 2))
//!     .then_sink(None, move |r| tx.send(r).unwrap());
//! resolver.resolve(5);
//! assert_eq!(rx.recv().unwrap(), Ok(10));
//! ```
//!
//! Contract violations (settling twice, registering two continuations,
//! over-decrementing a [`Latch`]) panic. Domain errors travel as the `Err`
//! side of [`ErrorResult`].
//!
pub mod context;
mod error;
pub mod future;
pub mod latch;
pub mod raw;
mod resolver;
pub mod result;
pub mod settled;

pub use context::{wrap, Context, ExecutionContext, Job, SerialQueue, SerialQueueBuilder};
pub use error::Panicked;
pub use future::{ErrorObserver, Future, PromiseOrValue};
pub use latch::Latch;
pub use raw::{Next, RawFuture};
pub use resolver::Resolver;
pub use result::{attempt, ErrorResult};
pub use settled::Settled;
