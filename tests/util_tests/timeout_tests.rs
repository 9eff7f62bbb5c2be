//! Tests for deadline-bounded execution

use std::thread;
use std::time::{Duration, Instant};

use aofkv::util::{retry, with_timeout, RetryPolicy};
use aofkv::KvError;

#[test]
fn test_result_within_deadline() {
    let value = with_timeout("quick", Duration::from_secs(1), || Ok(7)).unwrap();

    assert_eq!(value, 7);
}

#[test]
fn test_error_within_deadline_passes_through() {
    let err = with_timeout::<(), _>("failing", Duration::from_secs(1), || {
        Err(KvError::Persistence("broken".to_string()))
    })
    .unwrap_err();

    assert!(matches!(err, KvError::Persistence(_)));
}

#[test]
fn test_hanging_operation_times_out() {
    let started = Instant::now();

    let err = with_timeout("recovery", Duration::from_millis(50), || {
        thread::sleep(Duration::from_secs(2));
        Ok(())
    })
    .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(1));
    match err {
        KvError::Timeout { operation, elapsed_ms } => {
            assert_eq!(operation, "recovery");
            assert!(elapsed_ms >= 50);
        }
        other => panic!("expected Timeout, got {other}"),
    }
}

#[test]
fn test_deadline_bounds_retries() {
    let started = Instant::now();

    // Retries alone would take well over a second
    let err = with_timeout::<(), _>("recovery", Duration::from_millis(100), || {
        let policy = RetryPolicy::new(10, Duration::from_millis(200));
        retry("recovery", &policy, || Err(KvError::Persistence("unreadable".to_string())))
    })
    .unwrap_err();

    assert!(matches!(err, KvError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_panicking_operation_reports_error() {
    let err = with_timeout::<(), _>("panicky", Duration::from_secs(1), || panic!("boom"))
        .unwrap_err();

    assert!(matches!(err, KvError::Persistence(_)));
}
