// src/sync/async_channel.rs

use crate::error::EventletError;
use crate::runtime::Eventlet;

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

struct AsyncChannelInner<T> {
  /// Buffered messages, oldest first.
  queue: RefCell<VecDeque<T>>,
  /// Parked receivers, oldest first.
  receivers: RefCell<VecDeque<Eventlet>>,
}

/// A buffered channel: like [`Channel`](super::Channel), except that sending
/// never suspends.
///
/// Messages sent while nobody is receiving are queued and handed out in send
/// order. Receivers that arrive while the queue is empty park and are served
/// in the order they started waiting.
pub struct AsyncChannel<T> {
  inner: Rc<AsyncChannelInner<T>>,
}

impl<T> Clone for AsyncChannel<T> {
  fn clone(&self) -> Self {
    Self { inner: Rc::clone(&self.inner) }
  }
}

impl<T: Any> AsyncChannel<T> {
  pub fn new() -> Self {
    Self {
      inner: Rc::new(AsyncChannelInner {
        queue: RefCell::new(VecDeque::new()),
        receivers: RefCell::new(VecDeque::new()),
      }),
    }
  }

  /// Forwards `msg` to the longest-waiting receiver (resumed on the next
  /// tick), or queues it. Never suspends and works from outside eventlets.
  pub fn send(&self, msg: T) {
    let receiver = self.inner.receivers.borrow_mut().pop_front();
    match receiver {
      Some(receiver) => {
        tracing::trace!(receiver = %receiver.id(), "AsyncChannel handing message to waiting receiver");
        receiver.schedule_resume_with(msg);
      }
      None => {
        let mut queue = self.inner.queue.borrow_mut();
        queue.push_back(msg);
        tracing::trace!(queued = queue.len(), "AsyncChannel buffered message");
      }
    }
  }

  /// Returns the oldest queued message, or parks the calling eventlet until
  /// one is sent.
  pub async fn receive(&self) -> Result<T, EventletError> {
    if let Some(msg) = self.try_receive() {
      return Ok(msg);
    }

    let current = Eventlet::current().ok_or(EventletError::NotInEventlet)?;
    tracing::trace!(receiver = %current.id(), "AsyncChannel receiver parking until a message arrives");
    self.inner.receivers.borrow_mut().push_back(current);
    Eventlet::suspend::<T>().await
  }

  /// Pops the oldest queued message without ever suspending.
  pub fn try_receive(&self) -> Option<T> {
    self.inner.queue.borrow_mut().pop_front()
  }

  /// Number of buffered messages.
  pub fn len(&self) -> usize {
    self.inner.queue.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.queue.borrow().is_empty()
  }

  pub fn waiting_receivers(&self) -> usize {
    self.inner.receivers.borrow().len()
  }

  /// Buffered messages minus waiting receivers.
  pub fn balance(&self) -> isize {
    self.len() as isize - self.waiting_receivers() as isize
  }
}

impl<T: Any> Default for AsyncChannel<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> fmt::Debug for AsyncChannel<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AsyncChannel")
      .field("queued", &self.inner.queue.borrow().len())
      .field("waiting_receivers", &self.inner.receivers.borrow().len())
      .finish()
  }
}
