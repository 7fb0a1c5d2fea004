use std::any::Any;
use thiserror::Error;

/// A panic captured while running a user operation.
///
/// Error types used with [`Resolver::attempt_resolve`](crate::Resolver::attempt_resolve)
/// or [`Future::then_checked`](crate::Future::then_checked) implement
/// `From<Panicked>` so that an unwinding handler turns into a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation panicked: {message}")]
pub struct Panicked {
    message: String,
}

impl Panicked {
    /// Builds the error from a payload returned by `catch_unwind`.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => "<non-string panic payload>".to_owned(),
            },
        };
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
