// src/api.rs

//! Free-function face of the scheduler.
//!
//! These behave exactly like the associated functions on [`Eventlet`]; they
//! exist so eventlet code can read `spawn(..)` / `sleep(..)` without naming the
//! type.

use crate::runtime::{Completion, Eventlet, Sleep, Suspend};

use std::any::Any;
use std::future::Future;
use std::time::Duration;

/// Creates an eventlet running `work` and schedules it on the next tick of the
/// current hub. `work` never starts before `spawn` returns.
pub fn spawn<F, R>(work: F) -> Eventlet
where
  F: Future<Output = R> + 'static,
  R: Completion + 'static,
{
  Eventlet::spawn(work)
}

/// Creates an eventlet running `work` and schedules it after `delay`.
pub fn call_after<F, R>(delay: Duration, work: F) -> Eventlet
where
  F: Future<Output = R> + 'static,
  R: Completion + 'static,
{
  Eventlet::call_after(delay, work)
}

/// Yields the calling eventlet for at least `delay`.
pub fn sleep(delay: Duration) -> Sleep {
  Eventlet::sleep(delay)
}

/// Parks the calling eventlet until something resumes it.
pub fn suspend<V: Any>() -> Suspend<V> {
  Eventlet::suspend()
}

/// Cooperative yield: lets everything already scheduled run first.
pub fn yield_now() -> Sleep {
  Eventlet::sleep(Duration::ZERO)
}

/// The eventlet executing right now, if any.
pub fn current() -> Option<Eventlet> {
  Eventlet::current()
}
