// src/runtime/tokio_hub.rs

use super::hub::{Callback, Hub};

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

thread_local! {
  /// First panic that escaped a hub callback and has not been re-raised yet.
  static ESCAPED_PANIC: RefCell<Option<Box<dyn Any + Send>>> = const { RefCell::new(None) };
}

/// Hub backed by the tokio runtime the caller is already running on.
///
/// Callbacks become local tasks, so this hub must be used from inside a
/// `tokio::task::LocalSet` (the `#[eventlets::main]` and `#[eventlets::test]`
/// attributes set one up). Panics if called outside a `LocalSet`.
///
/// A panic raised by a callback (an eventlet under
/// [`FailurePolicy::Propagate`](super::FailurePolicy::Propagate)) is caught
/// in its task and kept on the thread. [`resume_escaped_panic`] re-raises it;
/// the attribute macros call it once the wrapped body has finished.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioHub;

fn run_callback(callback: Callback) {
  if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
    ESCAPED_PANIC.with(|slot| {
      let mut slot = slot.borrow_mut();
      if slot.is_none() {
        *slot = Some(payload);
      } else {
        tracing::error!("Dropping panic from hub callback, an earlier one is still pending");
      }
    });
  }
}

/// Takes the panic that escaped a `TokioHub` callback on this thread, if any.
pub fn take_escaped_panic() -> Option<Box<dyn Any + Send>> {
  ESCAPED_PANIC.with(|slot| slot.borrow_mut().take())
}

/// Re-raises the panic that escaped a `TokioHub` callback on this thread.
/// Does nothing if there is none.
pub fn resume_escaped_panic() {
  if let Some(payload) = take_escaped_panic() {
    panic::resume_unwind(payload);
  }
}

impl Hub for TokioHub {
  fn schedule_now(&self, callback: Callback) {
    // The LocalSet run queue is FIFO, which gives next-tick ordering.
    tokio::task::spawn_local(async move {
      run_callback(callback);
    });
  }

  fn schedule_after(&self, delay: Duration, callback: Callback) {
    tokio::task::spawn_local(async move {
      tokio::time::sleep(delay).await;
      run_callback(callback);
    });
  }
}
