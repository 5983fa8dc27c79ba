// src/lib.rs

//! eventlets - cooperative single-threaded coroutines for Rust.
//!
//! An [`Eventlet`] is a lightweight coroutine multiplexed onto one thread and
//! driven by a [`Hub`](runtime::Hub), the event loop that runs callbacks "on the
//! next tick" or "after a delay". Eventlets only give up control at explicit
//! suspension points, so code between two suspension points never races with
//! another eventlet.
//!
//! On top of eventlets sit three primitives:
//!
//! * [`Channel`] - synchronous rendezvous; whoever arrives first waits.
//! * [`AsyncChannel`] - buffered; senders never wait.
//! * [`Event`] - one value broadcast to any number of waiters.
//!
//! ```ignore
//! use eventlets::{spawn, Channel, EventletError};
//!
//! #[eventlets::main]
//! async fn main() {
//!   let channel = Channel::new();
//!   let tx = channel.clone();
//!   spawn(async move { tx.send("ping").await });
//!   spawn(async move {
//!     let msg = channel.receive().await?;
//!     println!("got {msg}");
//!     Ok::<(), EventletError>(())
//!   });
//!   tokio::time::sleep(std::time::Duration::from_millis(10)).await;
//! }
//! ```

/// Free-function scheduling facade (`spawn`, `sleep`, ...).
pub mod api;
/// Defines the error type shared by every operation in the crate.
pub mod error;
/// Eventlet handles, suspension points, hubs and runtime configuration.
pub mod runtime;
/// Channels and events built on eventlets.
pub mod sync;

/// Runs an async `main` on a current-thread tokio runtime inside a
/// `LocalSet`, so the default hub can schedule eventlets.
///
/// # Example
/// ```ignore
/// #[eventlets::main]
/// async fn main() {
///   // Your application code
/// }
/// ```
#[cfg(feature = "macros")]
pub use eventlets_macros::main;
/// `#[tokio::test]` counterpart of [`main`].
#[cfg(feature = "macros")]
pub use eventlets_macros::test;

pub use api::{call_after, current, sleep, spawn, suspend, yield_now};
pub use error::EventletError;
pub use runtime::{Eventlet, EventletBuilder, EventletId, FailurePolicy, Outcome, RuntimeConfig};
pub use sync::{AsyncChannel, Channel, Event};

// --- Top-Level Library Information Functions ---

/// Major version number of the eventlets library.
const VERSION_MAJOR: i32 = 0;
/// Minor version number of the eventlets library.
const VERSION_MINOR: i32 = 1;
/// Patch version number of the eventlets library.
const VERSION_PATCH: i32 = 0;

/// Returns the library version as a tuple (major, minor, patch).
///
/// # Examples
///
/// ```
/// let (major, minor, patch) = eventlets::version();
/// println!("eventlets version: {}.{}.{}", major, minor, patch);
/// ```
pub fn version() -> (i32, i32, i32) {
  (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}
