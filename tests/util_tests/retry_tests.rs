//! Tests for bounded retry

use std::cell::Cell;
use std::time::{Duration, Instant};

use aofkv::util::{retry, RetryPolicy};
use aofkv::KvError;

fn fast_policy(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(1))
}

#[test]
fn test_first_success_is_returned() {
    let calls = Cell::new(0);

    let value = retry("op", &fast_policy(3), || {
        calls.set(calls.get() + 1);
        Ok(42)
    })
    .unwrap();

    assert_eq!(value, 42);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_succeeds_after_failures() {
    let calls = Cell::new(0);

    let value = retry("op", &fast_policy(5), || {
        calls.set(calls.get() + 1);
        if calls.get() < 3 {
            Err(KvError::Network("not yet".to_string()))
        } else {
            Ok("done")
        }
    })
    .unwrap();

    assert_eq!(value, "done");
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_gives_up_after_attempts() {
    let calls = Cell::new(0);

    let err = retry::<(), _>("op", &fast_policy(4), || {
        calls.set(calls.get() + 1);
        Err(KvError::Persistence(format!("failure {}", calls.get())))
    })
    .unwrap_err();

    assert_eq!(calls.get(), 4);
    match err {
        KvError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 4);
            assert!(last.to_string().contains("failure 4"));
        }
        other => panic!("expected RetriesExhausted, got {other}"),
    }
}

#[test]
fn test_zero_attempts_still_tries_once() {
    let calls = Cell::new(0);

    let _ = retry::<(), _>("op", &fast_policy(0), || {
        calls.set(calls.get() + 1);
        Err(KvError::Network("down".to_string()))
    });

    assert_eq!(calls.get(), 1);
}

#[test]
fn test_backoff_doubles() {
    let policy = RetryPolicy::new(5, Duration::from_millis(300));

    assert_eq!(policy.delay_after(1), Duration::from_millis(300));
    assert_eq!(policy.delay_after(2), Duration::from_millis(600));
    assert_eq!(policy.delay_after(3), Duration::from_millis(1200));
}

#[test]
fn test_backoff_actually_waits() {
    let policy = RetryPolicy::new(3, Duration::from_millis(20));
    let started = Instant::now();

    let _ = retry::<(), _>("op", &policy, || Err(KvError::Network("down".to_string())));

    // 20 ms + 40 ms between the three attempts
    assert!(started.elapsed() >= Duration::from_millis(60));
}
