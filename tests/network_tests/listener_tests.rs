//! Tests for Listener and ShutdownCoordinator
//!
//! These tests verify:
//! - A pending accept returns promptly once the listener is closed
//! - Closing is idempotent and releases the port
//! - The coordinator drains exactly once
//! - Accept failures back off up to a ceiling and reset on success

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use aofkv::network::{
    AcceptBackoff, Listener, ShutdownCoordinator, State, ACCEPT_POLL_INTERVAL, MAX_ACCEPT_BACKOFF,
};
use aofkv::KvError;
use crossbeam::channel;

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

#[test]
fn test_accept_returns_client() {
    let listener = Listener::bind_addr(loopback()).unwrap();
    let addr = listener.local_addr();

    let client = TcpStream::connect(addr).unwrap();
    let (_stream, peer) = listener.accept().unwrap();

    assert_eq!(peer, client.local_addr().unwrap());
}

#[test]
fn test_close_unblocks_pending_accept() {
    let listener = Arc::new(Listener::bind_addr(loopback()).unwrap());

    let acceptor = {
        let listener = Arc::clone(&listener);
        thread::spawn(move || listener.accept().map(|_| ()))
    };

    thread::sleep(Duration::from_millis(50));
    let start = Instant::now();
    assert!(listener.close());

    let result = acceptor.join().unwrap();
    assert!(matches!(result, Err(KvError::ListenerClosed)));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_close_is_idempotent() {
    let listener = Listener::bind_addr(loopback()).unwrap();

    assert!(!listener.is_closed());
    assert!(listener.close());
    assert!(!listener.close());
    assert!(listener.is_closed());
    assert!(matches!(listener.accept(), Err(KvError::ListenerClosed)));
}

#[test]
fn test_close_releases_port() {
    let listener = Listener::bind_addr(loopback()).unwrap();
    let addr = listener.local_addr();

    listener.close();

    assert!(TcpListener::bind(addr).is_ok());
}

#[test]
fn test_bind_taken_port_is_network_error() {
    let taken = TcpListener::bind(loopback()).unwrap();

    let err = Listener::bind_addr(taken.local_addr().unwrap()).err().unwrap();

    assert!(matches!(err, KvError::Network(_)));
}

#[test]
fn test_coordinator_drains_once() {
    let listener = Arc::new(Listener::bind_addr(loopback()).unwrap());
    let coordinator = ShutdownCoordinator::new(Arc::clone(&listener));

    assert_eq!(coordinator.state(), State::Running);
    assert!(coordinator.begin_shutdown());
    assert!(!coordinator.begin_shutdown());

    assert_eq!(coordinator.state(), State::Draining);
    assert!(listener.is_closed());
}

#[test]
fn test_watch_triggers_on_signal() {
    let listener = Arc::new(Listener::bind_addr(loopback()).unwrap());
    let coordinator = Arc::new(ShutdownCoordinator::new(Arc::clone(&listener)));
    let (stop_tx, stop_rx) = channel::bounded(1);

    let watcher = coordinator.watch(stop_rx).unwrap();
    assert!(!coordinator.is_draining());

    stop_tx.send(()).unwrap();
    watcher.join().unwrap();

    assert!(coordinator.is_draining());
    assert!(listener.is_closed());
}

#[test]
fn test_watch_triggers_when_sender_dropped() {
    let listener = Arc::new(Listener::bind_addr(loopback()).unwrap());
    let coordinator = Arc::new(ShutdownCoordinator::new(listener));
    let (stop_tx, stop_rx) = channel::bounded::<()>(1);

    let watcher = coordinator.watch(stop_rx).unwrap();
    drop(stop_tx);
    watcher.join().unwrap();

    assert!(coordinator.is_draining());
}

#[test]
fn test_accept_backoff_doubles_to_ceiling() {
    let mut backoff = AcceptBackoff::new();

    assert_eq!(backoff.failed(), ACCEPT_POLL_INTERVAL);
    assert_eq!(backoff.failed(), ACCEPT_POLL_INTERVAL * 2);
    assert_eq!(backoff.failed(), ACCEPT_POLL_INTERVAL * 4);

    for _ in 0..100 {
        assert!(backoff.failed() <= MAX_ACCEPT_BACKOFF);
    }
    assert_eq!(backoff.failed(), MAX_ACCEPT_BACKOFF);
    assert_eq!(backoff.failures(), 104);

    backoff.succeeded();
    assert_eq!(backoff.failures(), 0);
    assert_eq!(backoff.failed(), ACCEPT_POLL_INTERVAL);
}

#[test]
fn test_accept_skips_clients_that_already_left() {
    let listener = Listener::bind_addr(loopback()).unwrap();
    let addr = listener.local_addr();

    for _ in 0..20 {
        drop(TcpStream::connect(addr).unwrap());
    }
    let client = TcpStream::connect(addr).unwrap();

    // Every queued connection is handed out or skipped; none ends the listener
    let mut last = None;
    for _ in 0..21 {
        match listener.accept() {
            Ok((_stream, peer)) => last = Some(peer),
            Err(e) => panic!("accept failed: {}", e),
        }
        if last == Some(client.local_addr().unwrap()) {
            break;
        }
    }
    assert_eq!(last, Some(client.local_addr().unwrap()));
    assert!(!listener.is_closed());
}
