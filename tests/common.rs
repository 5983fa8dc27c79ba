// tests/common.rs
#![allow(dead_code)] // Each test binary uses a different subset of helpers

use eventlets::{Eventlet, EventletError};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

/// Long enough for every next-tick hand-off to settle on the paused clock.
pub const SETTLE: Duration = Duration::from_millis(100);

static TRACING_INIT: Once = Once::new();

// Setup function to initialize tracing
pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Can be overridden by RUST_LOG env variable
    let default_filter = "eventlets=trace,info";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_env_filter(env_filter)
      .with_target(true) // Show module path
      .with_line_number(true)
      .with_span_events(FmtSpan::CLOSE)
      .with_test_writer() // Write to test output capture
      .finish();

    // Another test binary in the same process may have installed one already.
    let _ = tracing::subscriber::set_global_default(subscriber);
  });
}

/// Lets the hub run everything that is due, on tokio's paused clock.
pub async fn settle() {
  tokio::time::sleep(SETTLE).await;
}

/// Shared log eventlets append to so the test body can inspect ordering.
#[derive(Clone)]
pub struct Recorder<T> {
  entries: Rc<RefCell<Vec<T>>>,
}

impl<T: Clone> Recorder<T> {
  pub fn new() -> Self {
    Self { entries: Rc::new(RefCell::new(Vec::new())) }
  }

  pub fn push(&self, entry: T) {
    self.entries.borrow_mut().push(entry);
  }

  pub fn entries(&self) -> Vec<T> {
    self.entries.borrow().clone()
  }
}

/// Spawns an eventlet that receives `count` values via `recv` and records them.
pub fn spawn_collector<T, F, Fut>(count: usize, recorder: Recorder<T>, mut recv: F) -> Eventlet
where
  T: Clone + 'static,
  F: FnMut() -> Fut + 'static,
  Fut: std::future::Future<Output = Result<T, EventletError>> + 'static,
{
  eventlets::spawn(async move {
    for _ in 0..count {
      recorder.push(recv().await?);
    }
    Ok::<(), EventletError>(())
  })
}
