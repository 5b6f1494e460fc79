use super::*;

use std::{sync::Mutex, time::Duration};

use shared::{
    domain::{AlertId, Severity},
    notice::default_alert_script,
};

type Deliveries = Arc<Mutex<Vec<(AlertId, Duration)>>>;

fn event(id: i64, delay_ms: i64, severity: Severity) -> AlertEvent {
    AlertEvent::new(id, format!("alert {id}"), format!("message {id}"), severity, delay_ms)
        .expect("valid alert")
}

fn recorder(origin: Instant) -> (Deliveries, impl FnMut(AlertEvent) + Send + 'static) {
    let deliveries: Deliveries = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&deliveries);
    let on_event = move |event: AlertEvent| {
        sink.lock()
            .expect("deliveries lock")
            .push((event.id(), Instant::now() - origin));
    };
    (deliveries, on_event)
}

fn delivered_ids(deliveries: &Deliveries) -> Vec<i64> {
    deliveries
        .lock()
        .expect("deliveries lock")
        .iter()
        .map(|(id, _)| id.0)
        .collect()
}

async fn advance_ms(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn rejects_duplicate_ids() {
    let result = AlertScheduler::new(vec![
        event(1, 100, Severity::Info),
        event(1, 200, Severity::Warning),
    ]);
    assert!(matches!(result, Err(ShellError::DuplicateAlertId(1))));
}

#[test]
fn rejects_negative_delay_in_script() {
    let mut script = default_alert_script();
    script[1].delay_ms = -15;
    let result = AlertScheduler::from_script(script);
    assert!(matches!(
        result,
        Err(ShellError::NegativeDelay { id: 2, delay_ms: -15 })
    ));
}

#[test]
fn orders_by_delay_then_id() {
    let scheduler = AlertScheduler::new(vec![
        event(3, 500, Severity::Info),
        event(2, 100, Severity::Info),
        event(1, 100, Severity::Info),
    ])
    .expect("scheduler");
    let order: Vec<i64> = scheduler.events().iter().map(|e| e.id().0).collect();
    assert_eq!(order, vec![1, 2, 3]);
}

#[test]
fn start_outside_runtime_is_rejected() {
    let scheduler = AlertScheduler::new(vec![event(1, 10, Severity::Info)]).expect("scheduler");
    let result = scheduler.start(|_| {});
    assert!(matches!(result, Err(ShellError::RuntimeUnavailable)));
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn single_alert_fires_exactly_once() {
    let scheduler =
        AlertScheduler::new(vec![event(1, 100, Severity::Info)]).expect("scheduler");
    let (deliveries, on_event) = recorder(Instant::now());
    let handle = scheduler.start(on_event).expect("start");

    advance_ms(100).await;
    assert_eq!(delivered_ids(&deliveries), vec![1]);

    advance_ms(1_000).await;
    assert_eq!(delivered_ids(&deliveries), vec![1]);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn default_set_fires_in_order_and_on_time() {
    let scheduler = AlertScheduler::from_script(default_alert_script()).expect("scheduler");
    let (deliveries, on_event) = recorder(Instant::now());
    let _handle = scheduler.start(on_event).expect("start");

    let mut elapsed = 0;
    for (expected_count, delay) in [(1usize, 5_000u64), (2, 15_000), (3, 25_000)] {
        advance_ms(delay - 1 - elapsed).await;
        assert_eq!(
            deliveries.lock().expect("lock").len(),
            expected_count - 1,
            "alert due at {delay}ms fired early"
        );
        advance_ms(1).await;
        assert_eq!(deliveries.lock().expect("lock").len(), expected_count);
        elapsed = delay;
    }

    advance_ms(60_000).await;
    let recorded = deliveries.lock().expect("lock").clone();
    let ids: Vec<i64> = recorded.iter().map(|(id, _)| id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let epsilon = Duration::from_millis(5);
    for ((_, at), expected) in recorded.iter().zip([5_000u64, 15_000, 25_000]) {
        let expected = Duration::from_millis(expected);
        assert!(*at >= expected && *at <= expected + epsilon, "fired at {at:?}");
    }
    assert!(recorded.windows(2).all(|pair| pair[0].1 <= pair[1].1));
}

#[tokio::test(start_paused = true)]
async fn coinciding_deadlines_deliver_by_id() {
    let scheduler = AlertScheduler::new(vec![
        event(9, 300, Severity::Error),
        event(4, 300, Severity::Info),
    ])
    .expect("scheduler");
    let (deliveries, on_event) = recorder(Instant::now());
    let _handle = scheduler.start(on_event).expect("start");

    advance_ms(300).await;
    assert_eq!(delivered_ids(&deliveries), vec![4, 9]);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_elapse_suppresses_delivery() {
    let scheduler = AlertScheduler::new(vec![
        event(1, 100, Severity::Info),
        event(2, 400, Severity::Warning),
    ])
    .expect("scheduler");
    let (deliveries, on_event) = recorder(Instant::now());
    let handle = scheduler.start(on_event).expect("start");

    advance_ms(150).await;
    assert_eq!(delivered_ids(&deliveries), vec![1]);

    handle.cancel();
    assert!(handle.is_cancelled());
    advance_ms(1_000).await;
    assert_eq!(delivered_ids(&deliveries), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent_and_after_fire_never_refires() {
    let scheduler =
        AlertScheduler::new(vec![event(1, 100, Severity::Success)]).expect("scheduler");
    let (deliveries, on_event) = recorder(Instant::now());
    let handle = scheduler.start(on_event).expect("start");

    advance_ms(200).await;
    handle.cancel();
    handle.cancel();
    advance_ms(500).await;
    assert_eq!(delivered_ids(&deliveries), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_releases_timers() {
    let scheduler =
        AlertScheduler::new(vec![event(1, 100, Severity::Info)]).expect("scheduler");
    let (deliveries, on_event) = recorder(Instant::now());
    let handle = scheduler.start(on_event).expect("start");
    assert!(scheduler.is_running());

    drop(handle);
    assert!(!scheduler.is_running());
    advance_ms(500).await;
    assert!(delivered_ids(&deliveries).is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_start_requires_cancelling_the_first() {
    let scheduler =
        AlertScheduler::new(vec![event(1, 100, Severity::Info)]).expect("scheduler");
    let first = scheduler.start(|_| {}).expect("first start");

    let second = scheduler.start(|_| {});
    assert!(matches!(second, Err(ShellError::SchedulerAlreadyRunning)));

    first.cancel();
    let third = scheduler.start(|_| {});
    assert!(third.is_ok());
}

#[tokio::test(start_paused = true)]
async fn failing_delivery_leaves_other_alerts_on_schedule() {
    let scheduler = AlertScheduler::new(vec![
        event(1, 100, Severity::Warning),
        event(3, 100, Severity::Info),
        event(2, 200, Severity::Info),
    ])
    .expect("scheduler");
    let (deliveries, mut record) = recorder(Instant::now());
    let handle = scheduler
        .start(move |event: AlertEvent| {
            if event.id() == AlertId(1) {
                panic!("renderer rejected alert 1");
            }
            record(event);
        })
        .expect("start");

    advance_ms(100).await;
    assert_eq!(delivered_ids(&deliveries), vec![3]);

    advance_ms(99).await;
    assert_eq!(delivered_ids(&deliveries), vec![3]);
    advance_ms(1).await;
    assert_eq!(delivered_ids(&deliveries), vec![3, 2]);

    advance_ms(1_000).await;
    assert_eq!(delivered_ids(&deliveries), vec![3, 2]);
    assert!(handle.is_finished());
}
