use crate::runtime::EventletId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum EventletError {
  // --- Lifecycle Errors ---
  #[error("{0} has already finished and cannot be resumed")]
  Dead(EventletId),
  #[error("{0} is currently running and cannot be resumed")]
  AlreadyRunning(EventletId),
  #[error("Operation must be called from inside a running eventlet")]
  NotInEventlet,
  #[error("{id} was resumed with a value that is not a {expected}")]
  UnexpectedResumeValue { id: EventletId, expected: &'static str },

  // --- Event Errors ---
  #[error("Event has already been sent; reset it before sending again")]
  AlreadySent,

  // --- State Errors ---
  #[error("Operation is invalid for the current state: {0}")]
  InvalidState(&'static str),

  // --- Configuration Errors ---
  #[error("Invalid configuration value: {0}")]
  InvalidConfig(String),
}
