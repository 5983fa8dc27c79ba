// src/runtime/manual_hub.rs

//! A deterministic hub with a virtual clock.
//!
//! Nothing happens until the owner drives it: [`ManualHub::tick`] runs one
//! batch of ready callbacks, [`ManualHub::advance`] moves the clock forward and
//! fires timers that come due, [`ManualHub::run`] keeps going until there is
//! nothing left to do. Callbacks scheduled while a tick is running land in the
//! next tick, which is exactly the "strictly later tick" contract of [`Hub`].

use super::hub::{Callback, Hub};

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::mem;
use std::rc::Rc;
use std::time::Duration;

/// A callback waiting for the virtual clock to reach `due`.
///
/// [`BinaryHeap`] is a max heap, so the [`Ord`] implementation is reversed:
/// the earliest deadline compares greatest. Equal deadlines fall back to
/// insertion order.
struct Timer {
  due: Duration,
  seq: u64,
  callback: Callback,
}

impl PartialEq for Timer {
  fn eq(&self, other: &Self) -> bool {
    self.due == other.due && self.seq == other.seq
  }
}
impl Eq for Timer {}
impl PartialOrd for Timer {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}
impl Ord for Timer {
  fn cmp(&self, other: &Self) -> Ordering {
    other.due.cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
  }
}

#[derive(Default)]
struct ManualHubState {
  now: Duration,
  next_seq: u64,
  ready: VecDeque<Callback>,
  timers: BinaryHeap<Timer>,
}

#[derive(Default)]
pub struct ManualHub {
  state: RefCell<ManualHubState>,
}

impl ManualHub {
  pub fn new() -> Rc<Self> {
    Rc::new(Self::default())
  }

  /// Virtual time elapsed since the hub was created.
  pub fn now(&self) -> Duration {
    self.state.borrow().now
  }

  /// Number of callbacks that are ready or waiting on a timer.
  pub fn pending(&self) -> usize {
    let state = self.state.borrow();
    state.ready.len() + state.timers.len()
  }

  /// Moves every timer due at or before the current time onto the ready queue.
  fn fire_due_timers(&self) {
    let mut state = self.state.borrow_mut();
    let now = state.now;
    while state.timers.peek().is_some_and(|t| t.due <= now) {
      if let Some(timer) = state.timers.pop() {
        state.ready.push_back(timer.callback);
      }
    }
  }

  /// Runs one scheduler tick and returns how many callbacks it ran.
  ///
  /// Only the callbacks that were ready when the tick began are run; anything
  /// they schedule waits for the next tick.
  pub fn tick(&self) -> usize {
    self.fire_due_timers();
    // The borrow must be released before callbacks run, they schedule more work.
    let batch = mem::take(&mut self.state.borrow_mut().ready);
    let count = batch.len();
    for callback in batch {
      callback();
    }
    if count > 0 {
      tracing::trace!(count, now = ?self.now(), "ManualHub tick ran callbacks");
    }
    count
  }

  /// Ticks until no callback is ready at the current time. Returns the total
  /// number of callbacks run. Does not move the clock.
  pub fn run_until_idle(&self) -> usize {
    let mut total = 0;
    loop {
      let ran = self.tick();
      if ran == 0 {
        return total;
      }
      total += ran;
    }
  }

  /// Moves the clock forward by `by`, firing timers in deadline order and
  /// letting the hub go idle after each one.
  pub fn advance(&self, by: Duration) {
    let target = self.now().saturating_add(by);
    loop {
      self.run_until_idle();
      let next_due = self.state.borrow().timers.peek().map(|t| t.due);
      match next_due {
        Some(due) if due <= target => self.state.borrow_mut().now = due,
        _ => break,
      }
    }
    self.state.borrow_mut().now = target;
    self.run_until_idle();
  }

  /// Runs until nothing is ready and no timer is pending, jumping the clock
  /// straight to each next deadline.
  pub fn run(&self) {
    loop {
      self.run_until_idle();
      let next_due = self.state.borrow().timers.peek().map(|t| t.due);
      match next_due {
        Some(due) => {
          let mut state = self.state.borrow_mut();
          state.now = state.now.max(due);
        }
        None => return,
      }
    }
  }
}

impl Hub for ManualHub {
  fn schedule_now(&self, callback: Callback) {
    self.state.borrow_mut().ready.push_back(callback);
  }

  fn schedule_after(&self, delay: Duration, callback: Callback) {
    let mut state = self.state.borrow_mut();
    let due = state.now.saturating_add(delay);
    let seq = state.next_seq;
    state.next_seq += 1;
    state.timers.push(Timer { due, seq, callback });
  }
}
