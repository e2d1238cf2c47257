//! Tests for `SubscriberRegistry` fan-out.
//!
//! These drive the registry directly, without HTTP. They cover
//! subscribe/unsubscribe semantics, byte-identical fan-out, isolation of
//! closed subscribers, and concurrent mutation during broadcast.

use std::sync::Arc;
use std::thread;

use tipline_core::message::BroadcastMessage;
use tipline_events::frame::{encode_message, PING_FRAME};
use tipline_events::{DeliveryReport, SubscriberRegistry};

const THANKS_FRAME: &[u8] = b"data: {\"t\":\"donation\",\"message\":\"Thanks!\"}\n\n";

fn registry() -> Arc<SubscriberRegistry> {
    Arc::new(SubscriberRegistry::new())
}

// ---------------------------------------------------------------------------
// Test: subscribe() queues an initial ping before anything else
// ---------------------------------------------------------------------------

#[tokio::test]
async fn subscribe_sends_initial_ping() {
    let registry = registry();
    let mut sub = registry.subscribe();

    let first = sub.recv().await.expect("initial ping");
    assert_eq!(&first[..], PING_FRAME);
    assert!(sub.try_recv().is_none());
}

// ---------------------------------------------------------------------------
// Test: new registry starts empty; subscribe/unsubscribe adjust the count
// ---------------------------------------------------------------------------

#[tokio::test]
async fn subscribe_and_unsubscribe_adjust_count() {
    let registry = registry();
    assert_eq!(registry.subscriber_count(), 0);

    let a = registry.subscribe();
    let _b = registry.subscribe();
    assert_eq!(registry.subscriber_count(), 2);

    assert!(registry.unsubscribe(a.id()));
    assert_eq!(registry.subscriber_count(), 1);
}

// ---------------------------------------------------------------------------
// Test: unsubscribe() is idempotent, including the drop that follows it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsubscribe_is_idempotent() {
    let registry = registry();
    let sub = registry.subscribe();
    let id = sub.id();

    assert!(registry.unsubscribe(id));
    assert!(!registry.unsubscribe(id));
    drop(sub);
    assert!(!registry.unsubscribe(id));
    assert_eq!(registry.subscriber_count(), 0);
}

// ---------------------------------------------------------------------------
// Test: broadcast() delivers the same bytes to every subscriber
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_delivers_identical_frame_to_all() {
    let registry = registry();
    let mut subs: Vec<_> = (0..3).map(|_| registry.subscribe()).collect();

    let report = registry.broadcast(&BroadcastMessage::donation("Thanks!"));
    assert_eq!(report, DeliveryReport { delivered: 3, failed: 0 });

    for sub in &mut subs {
        assert_eq!(&sub.recv().await.unwrap()[..], PING_FRAME);
        assert_eq!(&sub.recv().await.unwrap()[..], THANKS_FRAME);
    }
}

// ---------------------------------------------------------------------------
// Test: frames to one subscriber keep call order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn frames_preserve_call_order_per_subscriber() {
    let registry = registry();
    let mut sub = registry.subscribe();

    registry.broadcast(&BroadcastMessage::donation("one"));
    registry.ping_all();
    registry.broadcast(&BroadcastMessage::donation("two"));

    let expected = [
        PING_FRAME.to_vec(),
        encode_message(&BroadcastMessage::donation("one")).unwrap().to_vec(),
        PING_FRAME.to_vec(),
        encode_message(&BroadcastMessage::donation("two")).unwrap().to_vec(),
    ];
    for frame in expected {
        assert_eq!(sub.recv().await.unwrap().to_vec(), frame);
    }
}

// ---------------------------------------------------------------------------
// Test: a subscriber registered after a broadcast sees nothing from it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn late_subscriber_does_not_see_earlier_broadcast() {
    let registry = registry();
    registry.broadcast(&BroadcastMessage::donation("early"));

    let mut late = registry.subscribe();
    assert_eq!(&late.recv().await.unwrap()[..], PING_FRAME);
    assert!(late.try_recv().is_none());
}

// ---------------------------------------------------------------------------
// Test: an unsubscribed handle receives nothing afterwards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn removed_subscriber_receives_nothing_after_removal() {
    let registry = registry();
    let mut gone = registry.subscribe();
    let mut stays = registry.subscribe();
    let _ = gone.recv().await;
    let _ = stays.recv().await;

    registry.unsubscribe(gone.id());
    let report = registry.broadcast(&BroadcastMessage::donation("after"));

    assert_eq!(report.delivered, 1);
    assert!(gone.try_recv().is_none());
    assert!(stays.try_recv().is_some());
}

// ---------------------------------------------------------------------------
// Test: broadcast with no subscribers is a no-op
// ---------------------------------------------------------------------------

#[test]
fn broadcast_with_no_subscribers_does_not_panic() {
    let registry = registry();
    let report = registry.broadcast(&BroadcastMessage::donation("orphan"));
    assert_eq!(report, DeliveryReport::default());
}

// ---------------------------------------------------------------------------
// Test: shutdown_all() ends every stream
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_ends_streams() {
    let registry = registry();
    let mut a = registry.subscribe();
    let mut b = registry.subscribe();

    assert_eq!(registry.shutdown_all(), 2);
    assert_eq!(registry.subscriber_count(), 0);

    // Already-queued frames drain, then the stream ends.
    assert_eq!(&a.recv().await.unwrap()[..], PING_FRAME);
    assert!(a.recv().await.is_none());
    assert_eq!(&b.recv().await.unwrap()[..], PING_FRAME);
    assert!(b.recv().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: concurrent subscribe/unsubscribe during broadcasts never panics
// ---------------------------------------------------------------------------

#[test]
fn concurrent_churn_during_broadcast_is_safe() {
    let registry = registry();
    let mut steady = registry.subscribe();

    let churners: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..500 {
                    let sub = registry.subscribe();
                    registry.unsubscribe(sub.id());
                    drop(sub);
                }
            })
        })
        .collect();

    let broadcaster = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..500 {
                registry.broadcast(&BroadcastMessage::donation(format!("m{i}")));
            }
        })
    };

    for handle in churners {
        handle.join().expect("churn thread panicked");
    }
    broadcaster.join().expect("broadcast thread panicked");

    assert_eq!(registry.subscriber_count(), 1);

    // The steady subscriber got the ping plus all 500 messages, in order.
    assert_eq!(&steady.try_recv().unwrap()[..], PING_FRAME);
    for i in 0..500 {
        let expected = encode_message(&BroadcastMessage::donation(format!("m{i}"))).unwrap();
        assert_eq!(steady.try_recv().unwrap(), expected);
    }
    assert!(steady.try_recv().is_none());
}
