// src/runtime/outcome.rs

use std::any::Any;
use std::fmt;

/// How an eventlet's work finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The work ran to completion.
  Returned,
  /// The work returned an `Err`; holds its `Display` text.
  Failed(String),
  /// The work panicked; holds the panic message when it was a string.
  Panicked(String),
}

impl Outcome {
  pub fn is_success(&self) -> bool {
    matches!(self, Outcome::Returned)
  }

  pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
    let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
      (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "non-string panic payload".to_string()
    };
    Outcome::Panicked(message)
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Outcome::Returned => write!(f, "returned"),
      Outcome::Failed(msg) => write!(f, "failed: {}", msg),
      Outcome::Panicked(msg) => write!(f, "panicked: {}", msg),
    }
  }
}

/// Values an eventlet's work may finish with.
///
/// Plain `()` always counts as success; `Result` lets work use `?` on channel
/// and event operations and have the error recorded as [`Outcome::Failed`].
pub trait Completion {
  fn into_outcome(self) -> Outcome;
}

impl Completion for () {
  fn into_outcome(self) -> Outcome {
    Outcome::Returned
  }
}

impl<E: fmt::Display> Completion for Result<(), E> {
  fn into_outcome(self) -> Outcome {
    match self {
      Ok(()) => Outcome::Returned,
      Err(e) => Outcome::Failed(e.to_string()),
    }
  }
}
