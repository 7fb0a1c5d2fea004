//! The error-aware result carried by every typed [`Future`](crate::Future).
//!
//! A settled future holds an [`ErrorResult`], which is plain [`Result`]: the
//! `?` operator is the checked accessor that yields the value or propagates
//! the captured error.
//!
use crate::Panicked;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Either a success value or a captured domain error.
pub type ErrorResult<T, E> = Result<T, E>;

/// Runs a fallible operation and captures either outcome.
///
/// An `Err` is converted into `E`; an unwinding panic is captured as
/// [`Panicked`] and converted as well.
///
/// # Examples
///
/// ```
/// use promise_latch::{attempt, Panicked};
///
/// #[derive(Debug, PartialEq)]
/// enum Error { Parse, Panic(String) }
/// impl From<Panicked> for Error {
///     fn from(p: Panicked) -> Self { Error::Panic(p.message().to_owned()) }
/// }
///
/// let ok: Result<u8, Error> = attempt(|| Ok::<_, Error>(3));
/// assert_eq!(ok, Ok(3));
/// let parsed: Result<u8, Error> = attempt(|| "x".parse::<u8>().map_err(|_| Error::Parse));
/// assert_eq!(parsed, Err(Error::Parse));
/// let panicked: Result<u8, Error> = attempt(|| -> Result<u8, Error> { panic!("nope") });
/// assert_eq!(panicked, Err(Error::Panic("nope".into())));
/// ```
pub fn attempt<T, E, X, F>(op: F) -> ErrorResult<T, E>
where
    F: FnOnce() -> Result<T, X>,
    X: Into<E>,
    E: From<Panicked>,
{
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(result) => result.map_err(Into::into),
        Err(payload) => Err(Panicked::from_payload(payload).into()),
    }
}
