// src/sync/channel.rs

use crate::error::EventletError;
use crate::runtime::Eventlet;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct ChannelInner<T> {
  /// Parked senders with their message. Stack: the most recent is served first.
  senders: RefCell<Vec<(Eventlet, T)>>,
  /// Parked receivers. Stack: the most recent is served first.
  receivers: RefCell<Vec<Eventlet>>,
}

/// A synchronous rendezvous channel between eventlets.
///
/// A transfer needs both parties:
///
/// * If an eventlet calls `send` with no receiver waiting, it is parked until
///   another eventlet calls `receive`.
/// * If an eventlet calls `receive` with no sender waiting, it is parked until
///   another eventlet calls `send`.
/// * Once a pair meets, the party that arrived second continues immediately
///   and the parked one is resumed on the next hub tick.
///
/// Waiting senders and waiting receivers are both served last-in-first-out.
/// Nothing detects two eventlets that both wait to send (or both wait to
/// receive) on each other; they stay parked for good.
pub struct Channel<T> {
  inner: Rc<ChannelInner<T>>,
}

impl<T> Clone for Channel<T> {
  fn clone(&self) -> Self {
    Self { inner: Rc::clone(&self.inner) }
  }
}

impl<T: Any> Channel<T> {
  pub fn new() -> Self {
    Self {
      inner: Rc::new(ChannelInner {
        senders: RefCell::new(Vec::new()),
        receivers: RefCell::new(Vec::new()),
      }),
    }
  }

  /// Hands `msg` to a receiver.
  ///
  /// With a receiver waiting, the most recent one is resumed on the next tick
  /// with `msg` and this call returns without suspending. Otherwise the calling
  /// eventlet parks until a receiver takes the message.
  pub async fn send(&self, msg: T) -> Result<(), EventletError> {
    let receiver = self.inner.receivers.borrow_mut().pop();
    if let Some(receiver) = receiver {
      tracing::trace!(receiver = %receiver.id(), "Channel handing message to waiting receiver");
      receiver.schedule_resume_with(msg);
      return Ok(());
    }

    let current = Eventlet::current().ok_or(EventletError::NotInEventlet)?;
    tracing::trace!(sender = %current.id(), "Channel sender parking until a receiver arrives");
    self.inner.senders.borrow_mut().push((current, msg));
    Eventlet::suspend::<()>().await
  }

  /// Takes a message from a sender.
  ///
  /// With a sender waiting, its message is returned immediately and the
  /// sender is resumed on the next tick. Otherwise the calling eventlet parks
  /// until a sender arrives.
  pub async fn receive(&self) -> Result<T, EventletError> {
    let sender = self.inner.senders.borrow_mut().pop();
    if let Some((sender, msg)) = sender {
      tracing::trace!(sender = %sender.id(), "Channel took message from waiting sender");
      sender.schedule_resume_with(());
      return Ok(msg);
    }

    let current = Eventlet::current().ok_or(EventletError::NotInEventlet)?;
    tracing::trace!(receiver = %current.id(), "Channel receiver parking until a sender arrives");
    self.inner.receivers.borrow_mut().push(current);
    Eventlet::suspend::<T>().await
  }

  /// Waiting senders minus waiting receivers. Positive means senders are
  /// parked, negative means receivers are.
  pub fn balance(&self) -> isize {
    self.waiting_senders() as isize - self.waiting_receivers() as isize
  }

  pub fn waiting_senders(&self) -> usize {
    self.inner.senders.borrow().len()
  }

  pub fn waiting_receivers(&self) -> usize {
    self.inner.receivers.borrow().len()
  }
}

impl<T: Any> Default for Channel<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> fmt::Debug for Channel<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Channel")
      .field("waiting_senders", &self.inner.senders.borrow().len())
      .field("waiting_receivers", &self.inner.receivers.borrow().len())
      .finish()
  }
}
