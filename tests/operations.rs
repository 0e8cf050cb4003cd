//! Operation tracking: lazy start, exactly-once end, pass-through results.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::StreamExt;
use loadvisor::{Event, EventKind, IndicatorId, OperationError, Registry};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

fn load() -> Option<IndicatorId> {
    Some(IndicatorId::name("load"))
}

/// Collects the busy values of every `BusySet` event received so far.
fn busy_sets(rx: &mut broadcast::Receiver<Event>) -> Vec<bool> {
    std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|ev| ev.kind == EventKind::BusySet)
        .filter_map(|ev| ev.busy)
        .collect()
}

async fn succeeds_after_delay<T>(value: T, delay: Duration) -> T {
    tokio::time::sleep(delay).await;
    value
}

#[tokio::test(start_paused = true)]
async fn delayed_value_scenario() {
    let reg: Registry<&'static str> = Registry::new();
    let mut rx = reg.events();

    let wrapped = reg.wrap(
        succeeds_after_delay("X", Duration::from_secs(2)),
        &"ownerA",
        load(),
    );
    let handle = tokio::spawn(wrapped);
    tokio::task::yield_now().await;

    assert!(reg.is_busy(&"ownerA", load()));

    let value = handle.await.unwrap();
    assert_eq!(value, "X");
    assert!(!reg.is_busy(&"ownerA", load()));
    assert_eq!(busy_sets(&mut rx), vec![true, false]);
}

#[tokio::test]
async fn busy_is_set_before_the_operation_runs() {
    let reg: Registry<&'static str> = Registry::new();
    let seen_busy = Arc::new(AtomicBool::new(false));

    let probe = {
        let reg = reg.clone();
        let seen_busy = Arc::clone(&seen_busy);
        async move {
            seen_busy.store(reg.is_busy(&"a", load()), Ordering::SeqCst);
        }
    };
    reg.wrap(probe, &"a", load()).await;

    assert!(seen_busy.load(Ordering::SeqCst));
    assert!(!reg.is_busy(&"a", load()));
}

#[tokio::test]
async fn never_polled_wrap_touches_nothing() {
    let reg: Registry<&'static str> = Registry::new();
    let mut rx = reg.events();

    let wrapped = reg.wrap(async { 1 }, &"a", load());
    drop(wrapped);

    assert!(reg.owners().is_empty());
    assert!(busy_sets(&mut rx).is_empty());
}

#[tokio::test]
async fn failure_is_passed_through_and_flag_cleared() {
    let reg: Registry<&'static str> = Registry::new();
    let mut rx = reg.events();

    let res: Result<(), std::io::Error> = reg
        .wrap(
            async { Err(std::io::Error::other("connection reset")) },
            &"a",
            None,
        )
        .await;

    assert_eq!(res.unwrap_err().to_string(), "connection reset");
    assert!(!reg.is_busy(&"a", None));
    assert_eq!(busy_sets(&mut rx), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn cancelled_wrap_still_clears_flag_once() {
    let reg: Registry<&'static str> = Registry::new();
    let mut rx = reg.events();

    let handle = tokio::spawn(reg.wrap(
        succeeds_after_delay((), Duration::from_secs(60)),
        &"a",
        load(),
    ));
    tokio::task::yield_now().await;
    assert!(reg.is_busy(&"a", load()));

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    assert!(!reg.is_busy(&"a", load()));
    assert_eq!(busy_sets(&mut rx), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn overlapping_wraps_are_last_write_wins() {
    let reg: Registry<&'static str> = Registry::new();

    let short = tokio::spawn(reg.wrap(
        succeeds_after_delay((), Duration::from_secs(1)),
        &"a",
        load(),
    ));
    let long = tokio::spawn(reg.wrap(
        succeeds_after_delay((), Duration::from_secs(5)),
        &"a",
        load(),
    ));
    tokio::task::yield_now().await;
    assert!(reg.is_busy(&"a", load()));

    short.await.unwrap();
    // The long operation is still running, but the short one's end cleared the flag.
    assert!(!reg.is_busy(&"a", load()));
    assert!(!long.is_finished());

    long.await.unwrap();
    assert!(!reg.is_busy(&"a", load()));
}

#[tokio::test]
async fn observer_sees_start_and_end_of_a_wrap() {
    let reg: Registry<&'static str> = Registry::new();
    let mut stream = reg.observe(&"a", load());

    reg.wrap(async {}, &"a", load()).await;

    let seen: Vec<bool> = stream.by_ref().take(3).collect().await;
    assert_eq!(seen, vec![false, true, false]);
}

#[tokio::test]
async fn owner_guard_wraps_and_streams() {
    let reg: Registry = Registry::new();
    let page = reg.register();

    let text = page.wrap(async { "Peek-a-boo 1" }, load()).await;
    assert_eq!(text, "Peek-a-boo 1");

    let rows: Vec<u32> = page
        .wrap_stream(futures::stream::iter([1, 2, 3]), Some(IndicatorId::Index(0)))
        .collect()
        .await;
    assert_eq!(rows, vec![1, 2, 3]);
    assert!(!page.is_busy(None));
}

#[tokio::test(start_paused = true)]
async fn operation_timeout_and_cancel_clear_the_flag() {
    let reg: Registry<&'static str> = Registry::new();

    let timed = reg
        .operation(&"a")
        .indicator("fetch")
        .timeout(Duration::from_secs(1))
        .run(succeeds_after_delay(1, Duration::from_secs(10)))
        .await;
    assert_eq!(
        timed,
        Err(OperationError::Timeout {
            timeout: Duration::from_secs(1)
        })
    );
    assert!(!reg.is_busy(&"a", None));

    let token = CancellationToken::new();
    let op = tokio::spawn(
        reg.operation(&"a")
            .indicator("fetch")
            .cancel_on(token.clone())
            .run(succeeds_after_delay(2, Duration::from_secs(10))),
    );
    tokio::task::yield_now().await;
    assert!(reg.is_busy(&"a", Some("fetch".into())));

    token.cancel();
    assert_eq!(op.await.unwrap(), Err(OperationError::Canceled));
    assert!(!reg.is_busy(&"a", None));
}

#[tokio::test(start_paused = true)]
async fn owner_dropped_mid_wrap_stays_released() {
    let reg: Registry = Registry::new();
    let page = reg.register();
    let handle = page.id();
    let mut busy = page.observe(load());

    let pending = tokio::spawn(page.wrap(
        succeeds_after_delay("late", Duration::from_secs(1)),
        load(),
    ));
    tokio::task::yield_now().await;
    assert!(reg.is_busy(&handle, load()));

    drop(page);
    assert!(reg.owners().is_empty());
    assert!(!reg.is_busy(&handle, None));

    assert_eq!(pending.await.unwrap(), "late");

    assert!(reg.owners().is_empty());
    assert!(reg.indicators(&handle).is_empty());
    assert!(!reg.is_busy(&handle, None));

    let seen: Vec<bool> = busy.by_ref().collect().await;
    assert_eq!(seen, vec![false, true]);
}

#[tokio::test]
async fn owner_dropped_mid_stream_stays_released() {
    let reg: Registry = Registry::new();
    let page = reg.register();
    let handle = page.id();

    let mut rows = page.wrap_stream(futures::stream::iter([1, 2]), load());
    assert_eq!(rows.next().await, Some(1));
    assert!(reg.is_busy(&handle, load()));

    drop(page);
    let rest: Vec<u32> = rows.collect().await;

    assert_eq!(rest, vec![2]);
    assert!(reg.owners().is_empty());
}
