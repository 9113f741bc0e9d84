use boundq::{
    CancelReason, ConfigError, DrainPolicy, StopReason, SupervisorBuilder, SupervisorError,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn triggered_shutdown_is_lossless() {
    let supervisor = SupervisorBuilder::new()
        .with_capacity(4)
        .with_producers(3)
        .with_consumers(2)
        .build::<u64>()
        .unwrap();

    let handled = Arc::new(AtomicU64::new(0));
    let running = supervisor
        .spawn(
            |_| |n: u64| Some(n),
            |_| {
                let handled = Arc::clone(&handled);
                move |_: u64| {
                    handled.fetch_add(1, Ordering::Relaxed);
                }
            },
        )
        .unwrap();

    thread::sleep(Duration::from_millis(100));
    assert!(running.trigger());
    let report = running.shutdown().unwrap();

    assert_eq!(report.reason, CancelReason::Triggered);
    assert_eq!(report.producers.len(), 3);
    assert_eq!(report.consumers.len(), 2);
    assert!(report.produced() > 0);
    assert!(report.is_lossless());
    assert_eq!(handled.load(Ordering::Relaxed), report.consumed());
    assert!(report
        .producers
        .iter()
        .all(|p| p.stop == StopReason::Cancelled(CancelReason::Triggered)));
    assert!(report.consumers.iter().all(|c| c.stop == StopReason::Closed));
}

#[test]
fn deadline_shutdown_with_slow_consumer_drains_backlog() {
    // Producers outrun the consumer and sit blocked on a full queue when the
    // deadline hits; they must still stop, and the backlog must be drained.
    let start = Instant::now();
    let supervisor = SupervisorBuilder::new()
        .with_capacity(8)
        .with_producers(2)
        .with_consumers(1)
        .with_timeout(Duration::from_millis(150))
        .with_consumer_pacing(Duration::from_millis(5))
        .build::<u64>()
        .unwrap();

    let running = supervisor.spawn(|_| |n: u64| Some(n), |_| |_: u64| {}).unwrap();
    let report = running.shutdown().unwrap();

    assert!(start.elapsed() >= Duration::from_millis(150));
    assert_eq!(report.reason, CancelReason::DeadlineExceeded);
    assert!(report.is_lossless());
    assert!(report.consumed() >= 8, "backlog should have been drained");
}

#[test]
fn exhausted_producers_still_wait_for_shutdown() {
    let supervisor = SupervisorBuilder::new()
        .with_capacity(2)
        .with_producers(2)
        .with_consumers(2)
        .build::<u64>()
        .unwrap();

    let running = supervisor
        .spawn(|_| |n: u64| (n < 10).then_some(n), |_| |_: u64| {})
        .unwrap();
    thread::sleep(Duration::from_millis(50));
    running.trigger();
    let report = running.shutdown().unwrap();

    assert_eq!(report.produced(), 20);
    assert_eq!(report.consumed(), 20);
    assert!(report.producers.iter().all(|p| p.stop == StopReason::Exhausted));
}

#[test]
fn abandon_policy_may_leave_messages_behind() {
    let supervisor = SupervisorBuilder::new()
        .with_capacity(16)
        .with_producers(1)
        .with_consumers(1)
        .with_drain_policy(DrainPolicy::Abandon)
        .with_consumer_pacing(Duration::from_secs(3600))
        .build::<u64>()
        .unwrap();

    let running = supervisor.spawn(|_| |n: u64| Some(n), |_| |_: u64| {}).unwrap();
    thread::sleep(Duration::from_millis(100));
    running.trigger();
    let report = running.shutdown().unwrap();

    assert!(report.consumed() >= 1);
    assert!(report.produced() > report.consumed());
    assert!(!report.is_lossless());
}

#[test]
fn panicking_handler_is_reported() {
    let supervisor = SupervisorBuilder::new()
        .with_capacity(4)
        .with_producers(1)
        .with_consumers(2)
        .build::<u64>()
        .unwrap();

    let running = supervisor
        .spawn(
            |_| |n: u64| Some(n),
            // Every consumer dies on its first message; consumer-0 is joined first.
            |_| |_: u64| panic!("handler failure"),
        )
        .unwrap();
    thread::sleep(Duration::from_millis(50));
    running.trigger();

    match running.shutdown() {
        Err(SupervisorError::RolePanicked { role }) => assert_eq!(role, "consumer-0"),
        other => panic!("expected RolePanicked, got {other:?}"),
    }
}

#[test]
fn builder_validates_configuration() {
    assert!(matches!(
        SupervisorBuilder::new().with_capacity(0).build::<u8>(),
        Err(ConfigError::ZeroCapacity)
    ));
    assert!(matches!(
        SupervisorBuilder::new().with_producers(0).build::<u8>(),
        Err(ConfigError::NoWorkers { role: "producer" })
    ));
    assert!(matches!(
        SupervisorBuilder::new().with_consumers(0).build::<u8>(),
        Err(ConfigError::NoWorkers { role: "consumer" })
    ));
}

#[test]
fn supervisor_exposes_queue_and_token() {
    let supervisor = SupervisorBuilder::new()
        .with_capacity(5)
        .with_timeout(Duration::from_secs(60))
        .build::<u8>()
        .unwrap();
    assert_eq!(supervisor.queue().capacity(), 5);
    assert!(supervisor.token().deadline().is_some());

    let running = supervisor
        .spawn(|_| |_: u64| None::<u8>, |_| |_: u8| {})
        .unwrap();
    assert!(!running.queue().is_closed());
    running.token().cancel();
    let report = running.shutdown().unwrap();
    assert_eq!(report.produced(), 0);
    assert!(report.is_lossless());
}

#[test]
fn unbounded_timeout_runs_until_triggered() {
    let supervisor = SupervisorBuilder::new()
        .with_timeout(Duration::MAX)
        .build::<u8>()
        .unwrap();
    assert_eq!(supervisor.token().deadline(), None);

    let running = supervisor
        .spawn(|_| |_: u64| None::<u8>, |_| |_: u8| {})
        .unwrap();
    assert!(running.trigger());
    assert_eq!(running.shutdown().unwrap().reason, CancelReason::Triggered);
}
