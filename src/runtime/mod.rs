// src/runtime/mod.rs

//! Core cooperative runtime: eventlet handles, suspension points and hubs.

pub mod config;
pub mod eventlet;
pub mod hub;
pub mod manual_hub;
pub mod outcome;
pub mod suspend;
pub mod tokio_hub;

pub use config::{configure, FailurePolicy, RuntimeConfig};
pub use eventlet::{Eventlet, EventletBuilder, EventletId};
pub use hub::{Callback, Hub, HubGuard};
pub use manual_hub::ManualHub;
pub use outcome::{Completion, Outcome};
pub use suspend::{Sleep, Suspend};
pub use tokio_hub::{resume_escaped_panic, take_escaped_panic, TokioHub};
