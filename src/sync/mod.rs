// src/sync/mod.rs

//! Synchronization primitives for eventlets.
//!
//! All of them are single-threaded (`!Send`), cheap to clone (clones share
//! state) and never resume a waiting eventlet synchronously: every hand-off
//! goes through the waiter's hub on the next tick.

pub mod async_channel;
pub mod channel;
pub mod event;

pub use async_channel::AsyncChannel;
pub use channel::Channel;
pub use event::Event;
