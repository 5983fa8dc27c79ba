// tests/event.rs

use eventlets::{Event, EventletError};
use tokio_test::{assert_err, assert_ok};
mod common;

use common::Recorder;

// --- A new event ---

#[eventlets::test(start_paused = true)]
async fn test_new_event_is_not_ready() {
  common::setup_tracing();
  let event: Event<&str> = Event::new();
  assert!(!event.ready());
}

#[eventlets::test(start_paused = true)]
async fn test_new_event_blocks_on_wait() {
  common::setup_tracing();
  let event: Event<&str> = Event::new();
  let ev = event.clone();
  let waiter = eventlets::spawn(async move { ev.wait().await.map(|_| ()) });
  common::settle().await;
  assert!(waiter.alive());
  assert_eq!(event.waiter_count(), 1);
}

#[eventlets::test(start_paused = true)]
async fn test_new_event_does_not_block_on_send() {
  common::setup_tracing();
  let event = Event::new();
  let ev = event.clone();
  let sender = eventlets::spawn(async move { ev.send(()) });
  common::settle().await;
  assert!(!sender.alive());
  assert!(event.ready());
}

// --- Waiting on an event ---

#[eventlets::test(start_paused = true)]
async fn test_wait_returns_value_passed_to_send() {
  common::setup_tracing();
  let event = Event::new();
  let got = Recorder::new();
  let (ev, g) = (event.clone(), got.clone());
  let waiter = eventlets::spawn(async move {
    g.push(ev.wait().await?);
    Ok::<(), EventletError>(())
  });
  let ev = event.clone();
  let sender = eventlets::spawn(async move { ev.send("done") });
  common::settle().await;
  assert!(!waiter.alive());
  assert!(!sender.alive());
  assert_eq!(got.entries(), vec!["done"]);
}

#[eventlets::test(start_paused = true)]
async fn test_wait_returns_same_value_to_multiple_waiters() {
  common::setup_tracing();
  let event = Event::new();
  let got = Recorder::new();
  for _ in 0..5 {
    let (ev, g) = (event.clone(), got.clone());
    eventlets::spawn(async move {
      g.push(ev.wait().await?);
      Ok::<(), EventletError>(())
    });
  }
  let ev = event.clone();
  eventlets::spawn(async move { ev.send("all_done") });
  common::settle().await;
  assert_eq!(got.entries(), vec!["all_done"; 5]);
}

#[eventlets::test(start_paused = true)]
async fn test_wait_returns_same_value_to_same_waiter() {
  common::setup_tracing();
  let event = Event::new();
  let got = Recorder::new();
  let (ev, g) = (event.clone(), got.clone());
  let waiter = eventlets::spawn(async move {
    for _ in 0..5 {
      g.push(ev.wait().await?);
    }
    Ok::<(), EventletError>(())
  });
  let ev = event.clone();
  eventlets::spawn(async move { ev.send("still_done") });
  common::settle().await;
  assert!(!waiter.alive());
  assert_eq!(got.entries(), vec!["still_done"; 5]);
}

// --- Sending an event ---

#[eventlets::test(start_paused = true)]
async fn test_sending_twice_fails() {
  common::setup_tracing();
  let event = Event::new();
  let results = Recorder::new();
  for value in ["one", "two"] {
    let (ev, r) = (event.clone(), results.clone());
    eventlets::spawn(async move { r.push(ev.send(value)) });
  }
  common::settle().await;
  let results = results.entries();
  assert_ok!(&results[0]);
  assert_eq!(results[1], Err(EventletError::AlreadySent));
  assert_eq!(event.try_get(), Some("one"));
}

// --- Resetting an event ---

#[eventlets::test(start_paused = true)]
async fn test_reset_of_unsent_event_fails() {
  common::setup_tracing();
  let event: Event<&str> = Event::new();
  assert_err!(event.reset());
}

#[eventlets::test(start_paused = true)]
async fn test_reset_after_send_permits_sending_again() {
  common::setup_tracing();
  let event = Event::new();
  let ev = event.clone();
  let eventlet = eventlets::spawn(async move {
    ev.send("one")?;
    ev.reset()?;
    ev.send("two")?;
    // Exactly one further send is allowed.
    assert_eq!(ev.send("three"), Err(EventletError::AlreadySent));
    Ok::<(), EventletError>(())
  });
  common::settle().await;
  assert_eq!(eventlet.outcome(), Some(eventlets::Outcome::Returned));
  assert_eq!(event.try_get(), Some("two"));
}

#[eventlets::test(start_paused = true)]
async fn test_ready_allows_polling_a_set_of_events() {
  common::setup_tracing();
  let events: Vec<Event<u32>> = (0..3).map(|_| Event::new()).collect();
  let ev = events[1].clone();
  eventlets::call_after(std::time::Duration::from_millis(50), async move { ev.send(1) });

  assert!(events.iter().all(|e| !e.ready()));
  tokio::time::sleep(std::time::Duration::from_millis(100)).await;
  let ready: Vec<usize> = events.iter().enumerate().filter(|(_, e)| e.ready()).map(|(i, _)| i).collect();
  assert_eq!(ready, vec![1]);
}
