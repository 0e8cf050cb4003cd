//! # Example: loading_demo
//!
//! Demonstrates the three ways a page tracks its loading indicators.
//!
//! Shows how to:
//! - Wrap a delayed load so its indicator follows the load's lifetime
//! - Start/end an indicator by hand around a callback-style flow
//! - Observe an indicator as a stream (what a spinner overlay would consume)
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Registry::builder(cfg).with_subscribers([LogWriter]).build()
//!   ├─► page = registry.register()
//!   ├─► spawn overlay: page.observe(Wrapped) → print each transition
//!   ├─► page.wrap(delayed "Peek-a-boo 1", Wrapped)        (2s)
//!   ├─► page.start_loading(Manual) … sleep … end_loading  (3s)
//!   ├─► page.operation().timeout(1s).run(slow load)       → Timeout
//!   └─► drop(page) → overlay stream ends
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example loading_demo --features logging
//! ```

use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use loadvisor::{Config, IndicatorId, LogWriter, Registry, Subscribe};

/// Indicators used by the demo page.
#[derive(Clone, Copy, Debug)]
enum Indicator {
    Wrapped = 0,
    Manual = 1,
    Operation = 2,
}

impl From<Indicator> for IndicatorId {
    fn from(i: Indicator) -> Self {
        IndicatorId::Index(i as u32)
    }
}

async fn delayed<T>(value: T, delay: Duration) -> T {
    tokio::time::sleep(delay).await;
    value
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadvisor=debug".into()),
        )
        .init();

    println!("=== loading_demo ===\n");

    let cfg = Config {
        bus_capacity: 256,
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let registry: Registry = Registry::builder(cfg).with_subscribers(subs).build();
    let page = registry.register();

    let mut overlay = page.observe(Some(Indicator::Wrapped.into()));
    let overlay_task = tokio::spawn(async move {
        while let Some(busy) = overlay.next().await {
            println!("[overlay] spinner {}", if busy { "shown" } else { "hidden" });
        }
        println!("[overlay] stream ended");
    });

    // 1. Wrapped load.
    let text = page
        .wrap(
            delayed("Peek-a-boo 1", Duration::from_secs(2)),
            Some(Indicator::Wrapped.into()),
        )
        .await;
    println!("[wrapped] {text}");

    // 2. Manual start/end.
    page.start_loading(Some(Indicator::Manual.into()));
    println!("[manual] busy={}", page.is_busy(None));
    let text = delayed("Peek-a-boo 2", Duration::from_secs(3)).await;
    page.end_loading(Some(Indicator::Manual.into()));
    println!("[manual] {text}, busy={}", page.is_busy(None));

    // 3. Operation with a timeout.
    let res = page
        .operation()
        .indicator(Indicator::Operation)
        .timeout(Duration::from_secs(1))
        .run(delayed("Peek-a-boo 3", Duration::from_secs(10)))
        .await;
    match res {
        Ok(text) => println!("[operation] {text}"),
        Err(e) => println!("[operation] {} ({})", e.as_message(), e.as_label()),
    }

    drop(page);
    overlay_task.await?;

    // Subscriber delivery is best-effort and asynchronous: the registry owns
    // the fan-out listener, so give the log worker a moment before exiting.
    // Lines still queued when the runtime stops are lost.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
