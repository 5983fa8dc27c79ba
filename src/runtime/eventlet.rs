// src/runtime/eventlet.rs

//! The eventlet handle: one cooperative thread of control.
//!
//! An eventlet wraps a local future and drives it by hand. `resume` polls the
//! future exactly once; the future only returns `Pending` at this crate's
//! suspension points ([`Suspend`], [`Sleep`]), so one resume runs the work up
//! to its next suspension point or to completion, like switching into a
//! stackful coroutine. While an eventlet is being polled it is published in a
//! scoped task-local slot, which is what [`Eventlet::current`] reads.

use super::config::{self, FailurePolicy};
use super::hub::{self, Hub};
use super::outcome::{Completion, Outcome};
use super::suspend::{Sleep, Suspend};
use crate::error::EventletError;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};
use tracing::{debug, error, trace, warn};

tokio::task_local! {
  static CURRENT: Eventlet;
}

static NEXT_EVENTLET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an eventlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventletId(u64);

impl EventletId {
  fn next() -> Self {
    EventletId(NEXT_EVENTLET_ID.fetch_add(1, Ordering::Relaxed))
  }

  pub fn as_u64(self) -> u64 {
    self.0
  }
}

impl fmt::Display for EventletId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "eventlet#{}", self.0)
  }
}

enum State {
  /// Not running: either never started or parked at a suspension point.
  Suspended(LocalBoxFuture<'static, Outcome>),
  /// Currently being polled; the future is owned by the `resume` call.
  Running,
  Finished(Outcome),
}

struct EventletInner {
  id: EventletId,
  name: Option<String>,
  hub: Rc<dyn Hub>,
  failure_policy: FailurePolicy,
  state: RefCell<State>,
  /// Value carried by the resume in progress, consumed by the suspension
  /// point that wakes up.
  inbox: RefCell<Option<Box<dyn Any>>>,
}

/// Handle to a cooperative coroutine. Cloning the handle does not clone the
/// coroutine.
#[derive(Clone)]
pub struct Eventlet {
  inner: Rc<EventletInner>,
}

impl Eventlet {
  /// Wraps `work` without scheduling it. The eventlet is alive and starts on
  /// its first [`resume`](Self::resume).
  pub fn new<F, R>(work: F) -> Self
  where
    F: Future<Output = R> + 'static,
    R: Completion + 'static,
  {
    Self::builder().build(work)
  }

  /// Wraps `work` and schedules its first resume on the next hub tick.
  /// Returns before any of `work` runs.
  pub fn spawn<F, R>(work: F) -> Self
  where
    F: Future<Output = R> + 'static,
    R: Completion + 'static,
  {
    Self::builder().spawn(work)
  }

  /// Like [`spawn`](Self::spawn), but the first resume happens after `delay`.
  pub fn call_after<F, R>(delay: Duration, work: F) -> Self
  where
    F: Future<Output = R> + 'static,
    R: Completion + 'static,
  {
    Self::builder().call_after(delay, work)
  }

  pub fn builder() -> EventletBuilder {
    EventletBuilder::default()
  }

  /// The eventlet whose work is executing right now, or `None` when called
  /// from outside any eventlet.
  pub fn current() -> Option<Eventlet> {
    CURRENT.try_with(Eventlet::clone).ok()
  }

  /// Suspends the calling eventlet for at least `delay`.
  /// `Duration::ZERO` yields to everything already scheduled.
  pub fn sleep(delay: Duration) -> Sleep {
    Sleep::after(delay)
  }

  /// Suspends the calling eventlet until someone resumes it, and returns the
  /// value it was resumed with.
  pub fn suspend<V: Any>() -> Suspend<V> {
    Suspend::new()
  }

  pub fn id(&self) -> EventletId {
    self.inner.id
  }

  pub fn name(&self) -> Option<&str> {
    self.inner.name.as_deref()
  }

  /// The policy applied if the work fails, fixed when the eventlet is built.
  pub fn failure_policy(&self) -> FailurePolicy {
    self.inner.failure_policy
  }

  /// True until the wrapped work returns, fails or panics.
  pub fn alive(&self) -> bool {
    !matches!(*self.inner.state.borrow(), State::Finished(_))
  }

  /// How the work finished, or `None` while it is alive.
  pub fn outcome(&self) -> Option<Outcome> {
    match &*self.inner.state.borrow() {
      State::Finished(outcome) => Some(outcome.clone()),
      _ => None,
    }
  }

  /// Transfers control into the eventlet until it next suspends or finishes.
  pub fn resume(&self) -> Result<(), EventletError> {
    self.resume_boxed(Box::new(()))
  }

  /// Like [`resume`](Self::resume), handing `value` to the suspension point
  /// the eventlet is parked at.
  pub fn resume_with<V: Any>(&self, value: V) -> Result<(), EventletError> {
    self.resume_boxed(Box::new(value))
  }

  pub(crate) fn take_inbox(&self) -> Option<Box<dyn Any>> {
    self.inner.inbox.borrow_mut().take()
  }

  /// Asks the hub to resume this eventlet on the next tick with `value`.
  pub(crate) fn schedule_resume_with<V: Any>(&self, value: V) {
    let this = self.clone();
    self
      .inner
      .hub
      .schedule_now(Box::new(move || this.resume_from_hub(Box::new(value))));
  }

  /// Asks the hub to resume this eventlet once `delay` has passed. A zero
  /// delay is a plain next-tick resume.
  pub(crate) fn schedule_resume_after(&self, delay: Duration) {
    if delay.is_zero() {
      self.schedule_resume_with(());
      return;
    }
    let this = self.clone();
    self
      .inner
      .hub
      .schedule_after(delay, Box::new(move || this.resume_from_hub(Box::new(()))));
  }

  fn resume_from_hub(&self, value: Box<dyn Any>) {
    if let Err(e) = self.resume_boxed(value) {
      warn!(eventlet = %self.inner.id, error = %e, "Dropping scheduled resume");
    }
  }

  fn take_future(&self) -> Result<LocalBoxFuture<'static, Outcome>, EventletError> {
    let mut state = self.inner.state.borrow_mut();
    match mem::replace(&mut *state, State::Running) {
      State::Suspended(future) => Ok(future),
      State::Running => Err(EventletError::AlreadyRunning(self.inner.id)),
      finished @ State::Finished(_) => {
        *state = finished;
        Err(EventletError::Dead(self.inner.id))
      }
    }
  }

  fn resume_boxed(&self, value: Box<dyn Any>) -> Result<(), EventletError> {
    let mut future = self.take_future()?;
    *self.inner.inbox.borrow_mut() = Some(value);
    trace!(eventlet = %self.inner.id, "Resuming eventlet");

    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);
    let polled = CURRENT.sync_scope(self.clone(), || {
      panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)))
    });
    // A value nobody picked up must not leak into the next resume.
    self.inner.inbox.borrow_mut().take();

    match polled {
      Ok(Poll::Pending) => {
        *self.inner.state.borrow_mut() = State::Suspended(future);
        trace!(eventlet = %self.inner.id, "Eventlet suspended");
      }
      Ok(Poll::Ready(outcome)) => {
        drop(future);
        self.finish(outcome, None);
      }
      Err(payload) => {
        drop(future);
        let outcome = Outcome::from_panic(&*payload);
        self.finish(outcome, Some(payload));
      }
    }
    Ok(())
  }

  fn finish(&self, outcome: Outcome, panic_payload: Option<Box<dyn Any + Send>>) {
    *self.inner.state.borrow_mut() = State::Finished(outcome.clone());
    let id = self.inner.id;
    if outcome.is_success() {
      debug!(eventlet = %id, name = ?self.inner.name, "Eventlet finished");
      return;
    }
    match self.inner.failure_policy {
      FailurePolicy::Log => error!(eventlet = %id, name = ?self.inner.name, %outcome, "Eventlet failed"),
      FailurePolicy::Ignore => debug!(eventlet = %id, name = ?self.inner.name, %outcome, "Eventlet failed"),
      FailurePolicy::Propagate => match panic_payload {
        Some(payload) => panic::resume_unwind(payload),
        None => panic!("{} {}", id, outcome),
      },
    }
  }
}

impl PartialEq for Eventlet {
  fn eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.inner, &other.inner)
  }
}
impl Eq for Eventlet {}

impl fmt::Debug for Eventlet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Eventlet")
      .field("id", &self.inner.id)
      .field("name", &self.inner.name)
      .field("alive", &self.alive())
      .finish_non_exhaustive()
  }
}

/// Per-eventlet options. Anything left unset falls back to the runtime
/// configuration and the thread's current hub.
#[derive(Default)]
pub struct EventletBuilder {
  name: Option<String>,
  failure_policy: Option<FailurePolicy>,
  hub: Option<Rc<dyn Hub>>,
}

impl EventletBuilder {
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
    self.failure_policy = Some(policy);
    self
  }

  /// Drive this eventlet (and everything it schedules) on `hub` instead of the
  /// thread's current hub.
  pub fn hub(mut self, hub: Rc<dyn Hub>) -> Self {
    self.hub = Some(hub);
    self
  }

  /// Creates the eventlet without scheduling it.
  pub fn build<F, R>(self, work: F) -> Eventlet
  where
    F: Future<Output = R> + 'static,
    R: Completion + 'static,
  {
    let id = EventletId::next();
    let failure_policy = self.failure_policy.unwrap_or_else(|| config::current().failure_policy);
    let hub = self.hub.unwrap_or_else(hub::current);
    trace!(eventlet = %id, name = ?self.name, %failure_policy, "Created eventlet");
    Eventlet {
      inner: Rc::new(EventletInner {
        id,
        name: self.name,
        hub,
        failure_policy,
        state: RefCell::new(State::Suspended(async move { work.await.into_outcome() }.boxed_local())),
        inbox: RefCell::new(None),
      }),
    }
  }

  pub fn spawn<F, R>(self, work: F) -> Eventlet
  where
    F: Future<Output = R> + 'static,
    R: Completion + 'static,
  {
    let eventlet = self.build(work);
    debug!(eventlet = %eventlet.id(), "Spawning eventlet on next tick");
    eventlet.schedule_resume_with(());
    eventlet
  }

  pub fn call_after<F, R>(self, delay: Duration, work: F) -> Eventlet
  where
    F: Future<Output = R> + 'static,
    R: Completion + 'static,
  {
    let eventlet = self.build(work);
    debug!(eventlet = %eventlet.id(), ?delay, "Scheduling eventlet after delay");
    eventlet.schedule_resume_after(delay);
    eventlet
  }
}
