// src/sync/event.rs

use crate::error::EventletError;
use crate::runtime::Eventlet;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct EventInner<T> {
  result: RefCell<Option<T>>,
  waiters: RefCell<Vec<Eventlet>>,
}

/// Sends one value from one eventlet to any number of others.
///
/// Events differ from channels in two ways:
///
/// 1. `send` never suspends the sender;
/// 2. `send` works once. Call `reset` to arm the event for another `send`.
///
/// `wait` may be called any number of times and always yields the stored
/// value once there is one, which makes events a good fit for handing a
/// result back from a spawned eventlet.
pub struct Event<T> {
  inner: Rc<EventInner<T>>,
}

impl<T> Clone for Event<T> {
  fn clone(&self) -> Self {
    Self { inner: Rc::clone(&self.inner) }
  }
}

impl<T: Clone + Any> Event<T> {
  pub fn new() -> Self {
    Self {
      inner: Rc::new(EventInner {
        result: RefCell::new(None),
        waiters: RefCell::new(Vec::new()),
      }),
    }
  }

  /// Returns the sent value, parking the calling eventlet until `send` if
  /// there is none yet.
  pub async fn wait(&self) -> Result<T, EventletError> {
    if let Some(result) = self.try_get() {
      return Ok(result);
    }

    let current = Eventlet::current().ok_or(EventletError::NotInEventlet)?;
    tracing::trace!(waiter = %current.id(), "Eventlet waiting on event");
    self.inner.waiters.borrow_mut().push(current);
    Eventlet::suspend::<T>().await
  }

  /// Stores `value` and resumes every current waiter with it on the next
  /// tick. Fails with [`EventletError::AlreadySent`] if a value is already
  /// stored. The waiter list is only cleared by [`reset`](Self::reset).
  pub fn send(&self, value: T) -> Result<(), EventletError> {
    {
      let mut result = self.inner.result.borrow_mut();
      if result.is_some() {
        return Err(EventletError::AlreadySent);
      }
      *result = Some(value.clone());
    }

    let waiters = self.inner.waiters.borrow();
    tracing::debug!(waiters = waiters.len(), "Event sent");
    for waiter in waiters.iter() {
      waiter.schedule_resume_with(value.clone());
    }
    Ok(())
  }

  /// True iff `wait` would return without suspending.
  ///
  /// Useful for polling a set of events and only waiting on one that is ready.
  pub fn ready(&self) -> bool {
    self.inner.result.borrow().is_some()
  }

  /// The stored value, if `send` has happened since the last reset.
  pub fn try_get(&self) -> Option<T> {
    self.inner.result.borrow().clone()
  }

  /// Clears the stored value and the waiter list so the event can be sent
  /// again. Fails with [`EventletError::InvalidState`] on an event that was
  /// never sent.
  pub fn reset(&self) -> Result<(), EventletError> {
    if self.inner.result.borrow_mut().take().is_none() {
      return Err(EventletError::InvalidState("tried to reset an unsent event"));
    }
    self.inner.waiters.borrow_mut().clear();
    tracing::trace!("Event reset");
    Ok(())
  }

  /// Eventlets that called `wait` before the value was sent and have not been
  /// cleared by `reset`.
  pub fn waiter_count(&self) -> usize {
    self.inner.waiters.borrow().len()
  }
}

impl<T: Clone + Any> Default for Event<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> fmt::Debug for Event<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Event")
      .field("ready", &self.inner.result.borrow().is_some())
      .field("waiters", &self.inner.waiters.borrow().len())
      .finish()
  }
}
