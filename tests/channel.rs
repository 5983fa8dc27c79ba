// tests/channel.rs

use eventlets::{Channel, Eventlet, EventletError};
mod common;

use common::Recorder;

const PINGS: [&str; 4] = ["ping_one", "ping_two", "ping_three", "pang"];
const PONGS: [&str; 4] = ["pong_one", "pong_two", "pong_three", "pang"];

fn spawn_sender(channel: &Channel<&'static str>, msg: &'static str) -> Eventlet {
  let channel = channel.clone();
  eventlets::spawn(async move { channel.send(msg).await })
}

fn spawn_receiver(channel: &Channel<&'static str>, got: &Recorder<&'static str>) -> Eventlet {
  let (channel, got) = (channel.clone(), got.clone());
  eventlets::spawn(async move {
    got.push(channel.receive().await?);
    Ok::<(), EventletError>(())
  })
}

// --- Test: a sender with no receiver sleeps ---
#[eventlets::test(start_paused = true)]
async fn test_send_without_receiver_sleeps() {
  common::setup_tracing();
  let channel = Channel::new();
  let sender = spawn_sender(&channel, "foo");
  common::settle().await;
  assert!(sender.alive());
  assert_eq!(channel.balance(), 1);
}

// --- Test: the sleeping sender resumes after a receiver takes the message ---
#[eventlets::test(start_paused = true)]
async fn test_sender_resumes_after_receive() {
  common::setup_tracing();
  let channel = Channel::new();
  let got = Recorder::new();
  let sender = spawn_sender(&channel, "foo");
  common::settle().await;

  let receiver = spawn_receiver(&channel, &got);
  common::settle().await;
  assert!(!sender.alive());
  assert!(!receiver.alive());
  assert_eq!(got.entries(), vec!["foo"]);
}

// --- Test: a receiver with no sender sleeps, then gets the exact value ---
#[eventlets::test(start_paused = true)]
async fn test_receiver_resumes_after_send() {
  common::setup_tracing();
  let channel = Channel::new();
  let got = Recorder::new();
  let receiver = spawn_receiver(&channel, &got);
  common::settle().await;
  assert!(receiver.alive());
  assert_eq!(channel.balance(), -1);

  let sender = spawn_sender(&channel, "bar");
  assert!(sender.alive());
  common::settle().await;
  assert!(!sender.alive());
  assert!(!receiver.alive());
  assert_eq!(got.entries(), vec!["bar"]);
}

// --- Test: parked senders and receivers are both served LIFO ---
#[eventlets::test(start_paused = true)]
async fn test_waiting_parties_are_served_last_in_first_out() {
  common::setup_tracing();
  let channel = Channel::new();
  let got = Recorder::new();
  for msg in ["one", "two", "three"] {
    spawn_sender(&channel, msg);
  }
  common::settle().await;
  for _ in 0..3 {
    spawn_receiver(&channel, &got);
  }
  common::settle().await;
  assert_eq!(got.entries(), vec!["three", "two", "one"]);

  let labelled = Recorder::new();
  for label in ["r1", "r2", "r3"] {
    let (ch, l) = (channel.clone(), labelled.clone());
    eventlets::spawn(async move {
      l.push((label, ch.receive().await?));
      Ok::<(), EventletError>(())
    });
  }
  common::settle().await;
  assert_eq!(channel.waiting_receivers(), 3);

  let ch = channel.clone();
  let sender = eventlets::spawn(async move {
    for msg in ["a", "b", "c"] {
      ch.send(msg).await?;
    }
    Ok::<(), EventletError>(())
  });
  common::settle().await;
  assert!(!sender.alive());
  assert_eq!(labelled.entries(), vec![("r3", "a"), ("r2", "b"), ("r1", "c")]);
}

// --- Test: both sides send first and block on each other for good ---
#[eventlets::test(start_paused = true)]
async fn test_mirrored_ping_pong_deadlocks() {
  common::setup_tracing();
  let channel = Channel::new();
  let (ch, pinger_ch) = (channel.clone(), channel.clone());
  let pinger = eventlets::spawn(async move {
    for ping in PINGS {
      pinger_ch.send(ping).await?;
      let _pong = pinger_ch.receive().await?;
    }
    Ok::<(), EventletError>(())
  });
  let ponger = eventlets::spawn(async move {
    for pong in PONGS {
      ch.send(pong).await?;
      let _ping = ch.receive().await?;
    }
    Ok::<(), EventletError>(())
  });

  tokio::time::sleep(std::time::Duration::from_secs(10)).await;
  assert!(pinger.alive());
  assert!(ponger.alive());
  assert_eq!(channel.waiting_senders(), 2);
}

// --- Test: complementary roles exchange every message and both finish ---
#[eventlets::test(start_paused = true)]
async fn test_complementary_ping_pong_completes() {
  common::setup_tracing();
  let channel = Channel::new();
  let seen_by_pinger = Recorder::new();
  let seen_by_ponger = Recorder::new();

  let (ch, seen) = (channel.clone(), seen_by_pinger.clone());
  let pinger = eventlets::spawn(async move {
    for ping in PINGS {
      ch.send(ping).await?;
      seen.push(ch.receive().await?);
    }
    Ok::<(), EventletError>(())
  });
  let (ch, seen) = (channel.clone(), seen_by_ponger.clone());
  let ponger = eventlets::spawn(async move {
    for pong in PONGS {
      seen.push(ch.receive().await?);
      ch.send(pong).await?;
    }
    Ok::<(), EventletError>(())
  });

  common::settle().await;
  assert!(!pinger.alive());
  assert!(!ponger.alive());
  assert_eq!(seen_by_pinger.entries(), PONGS.to_vec());
  assert_eq!(seen_by_ponger.entries(), PINGS.to_vec());
  assert_eq!(channel.balance(), 0);
}
