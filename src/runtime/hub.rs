// src/runtime/hub.rs

//! The reactor contract eventlets are driven by.
//!
//! A hub only has to offer two primitives: run a callback on a later tick, and
//! run a callback after a delay. Everything else (who polls, how time passes)
//! belongs to the hub implementation. The hub used by new eventlets is looked
//! up per thread: whatever was installed with [`enter`], or a [`TokioHub`]
//! when nothing was.

use super::tokio_hub::TokioHub;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// A unit of work handed to a hub.
pub type Callback = Box<dyn FnOnce() + 'static>;

pub trait Hub {
  /// Runs `callback` on a future tick, strictly after the current call stack
  /// unwinds. Callbacks scheduled during the same tick run in FIFO order.
  fn schedule_now(&self, callback: Callback);

  /// Runs `callback` no earlier than `delay` from now.
  fn schedule_after(&self, delay: Duration, callback: Callback);
}

thread_local! {
  static CURRENT_HUB: RefCell<Option<Rc<dyn Hub>>> = const { RefCell::new(None) };
}

/// Returns the hub installed on this thread, or a [`TokioHub`] if none is.
pub fn current() -> Rc<dyn Hub> {
  CURRENT_HUB
    .with(|slot| slot.borrow().clone())
    .unwrap_or_else(|| Rc::new(TokioHub))
}

/// Installs `hub` as this thread's hub until the returned guard is dropped.
///
/// Guards nest: dropping one restores whatever hub was installed before it.
#[must_use = "the hub is uninstalled as soon as the guard is dropped"]
pub fn enter(hub: Rc<dyn Hub>) -> HubGuard {
  let previous = CURRENT_HUB.with(|slot| slot.borrow_mut().replace(hub));
  tracing::trace!(restores_previous = previous.is_some(), "Hub installed on current thread");
  HubGuard { previous }
}

/// Restores the previously installed hub on drop.
pub struct HubGuard {
  previous: Option<Rc<dyn Hub>>,
}

impl Drop for HubGuard {
  fn drop(&mut self) {
    let previous = self.previous.take();
    CURRENT_HUB.with(|slot| *slot.borrow_mut() = previous);
  }
}
