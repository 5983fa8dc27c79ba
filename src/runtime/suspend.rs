// src/runtime/suspend.rs

//! Suspension points. These are the only futures that park an eventlet.
//!
//! On first poll a suspension point captures the running eventlet and returns
//! `Pending`, which makes the eventlet's `resume` return to its caller. It
//! completes on the first later poll that finds a value in the eventlet's
//! inbox, i.e. on the next resume. An eventlet is expected to wait on one
//! suspension point at a time.

use super::eventlet::{Eventlet, EventletId};
use crate::error::EventletError;

use std::any::{self, Any};
use std::future::Future;
use std::marker::PhantomData;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

enum Phase {
  Start,
  Waiting(Eventlet),
  Done,
}

struct SuspendPoint {
  /// Schedule a timed resume when parking.
  delay: Option<Duration>,
  phase: Phase,
}

impl SuspendPoint {
  fn new(delay: Option<Duration>) -> Self {
    Self { delay, phase: Phase::Start }
  }

  fn poll_resume(&mut self) -> Poll<Result<(EventletId, Box<dyn Any>), EventletError>> {
    match mem::replace(&mut self.phase, Phase::Done) {
      Phase::Start => {
        let Some(current) = Eventlet::current() else {
          return Poll::Ready(Err(EventletError::NotInEventlet));
        };
        if let Some(delay) = self.delay {
          current.schedule_resume_after(delay);
        }
        tracing::trace!(eventlet = %current.id(), delay = ?self.delay, "Eventlet parking");
        self.phase = Phase::Waiting(current);
        Poll::Pending
      }
      Phase::Waiting(eventlet) => match eventlet.take_inbox() {
        Some(value) => Poll::Ready(Ok((eventlet.id(), value))),
        None => {
          // Polled without a resume for us (e.g. a sibling future in a join).
          self.phase = Phase::Waiting(eventlet);
          Poll::Pending
        }
      },
      Phase::Done => panic!("suspension point polled after completion"),
    }
  }
}

/// Parks the calling eventlet until it is resumed, yielding the resume value.
///
/// Resolves to [`EventletError::NotInEventlet`] outside an eventlet and to
/// [`EventletError::UnexpectedResumeValue`] if the resume carried something
/// other than a `V`.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Suspend<V> {
  point: SuspendPoint,
  _value: PhantomData<fn() -> V>,
}

impl<V: Any> Suspend<V> {
  pub(crate) fn new() -> Self {
    Self { point: SuspendPoint::new(None), _value: PhantomData }
  }
}

impl<V: Any> Future for Suspend<V> {
  type Output = Result<V, EventletError>;

  fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.get_mut().point.poll_resume().map(|resumed| {
      resumed.and_then(|(id, value)| {
        value
          .downcast::<V>()
          .map(|v| *v)
          .map_err(|_| EventletError::UnexpectedResumeValue { id, expected: any::type_name::<V>() })
      })
    })
  }
}

/// Parks the calling eventlet for a fixed delay. Whatever value the waking
/// resume carries is discarded.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Sleep {
  point: SuspendPoint,
}

impl Sleep {
  pub(crate) fn after(delay: Duration) -> Self {
    Self { point: SuspendPoint::new(Some(delay)) }
  }
}

impl Future for Sleep {
  type Output = Result<(), EventletError>;

  fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.get_mut().point.poll_resume().map(|resumed| resumed.map(|_| ()))
  }
}
