//! # Tracked stream: busy while a multi-value operation is running.
//!
//! ```text
//! TrackedStream::new(..)      → nothing happens (lazy)
//! first poll_next             → BusyGuard::start  (busy = true)
//! poll_next → Some(item)      → item passed through
//! poll_next → None            → guard dropped     (busy = false)
//! drop before None            → guard dropped     (busy = false)
//! ```

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

use crate::core::{IndicatorId, OwnerKey, Registry};
use crate::operations::BusyGuard;

enum State<O: OwnerKey> {
    Idle {
        registry: Registry<O>,
        owner: O,
        indicator: Option<IndicatorId>,
    },
    Running(BusyGuard<O>),
    Done,
}

/// Stream adapter created by [`Registry::wrap_stream`](crate::Registry::wrap_stream).
///
/// Items, including `Err` items of fallible streams, pass through unchanged.
#[must_use = "streams do nothing unless polled"]
pub struct TrackedStream<S, O: OwnerKey> {
    inner: Pin<Box<S>>,
    state: State<O>,
}

impl<S: Stream, O: OwnerKey> TrackedStream<S, O> {
    pub(crate) fn new(
        stream: S,
        registry: Registry<O>,
        owner: O,
        indicator: Option<IndicatorId>,
    ) -> Self {
        Self {
            inner: Box::pin(stream),
            state: State::Idle {
                registry,
                owner,
                indicator,
            },
        }
    }

    /// True once the first poll has happened and the stream has not ended.
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }
}

// The inner stream is boxed and the state is never pinned.
impl<S, O: OwnerKey> Unpin for TrackedStream<S, O> {}

impl<S: Stream, O: OwnerKey> Stream for TrackedStream<S, O> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        let this = &mut *self;
        if let State::Done = this.state {
            return Poll::Ready(None);
        }
        if matches!(this.state, State::Idle { .. }) {
            if let State::Idle {
                registry,
                owner,
                indicator,
            } = std::mem::replace(&mut this.state, State::Done)
            {
                this.state = State::Running(BusyGuard::start(registry, owner, indicator));
            }
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                // Drops the guard, clearing the flag.
                this.state = State::Done;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use futures::stream;

    use super::*;

    #[tokio::test]
    async fn busy_until_exhausted() {
        let reg: Registry<&'static str> = Registry::new();
        let mut s = reg.wrap_stream(stream::iter([1, 2]), &"a", None);
        assert!(!reg.is_busy(&"a", None));
        assert!(reg.owners().is_empty());

        assert_eq!(s.next().await, Some(1));
        assert!(reg.is_busy(&"a", None));
        assert!(s.is_running());
        assert_eq!(s.next().await, Some(2));
        assert!(reg.is_busy(&"a", None));

        assert_eq!(s.next().await, None);
        assert!(!reg.is_busy(&"a", None));
        assert_eq!(s.next().await, None);
    }

    #[tokio::test]
    async fn dropped_mid_stream_clears_flag() {
        let reg: Registry<&'static str> = Registry::new();
        let mut s = reg.wrap_stream(stream::iter(0..10), &"a", Some("rows".into()));
        assert_eq!(s.next().await, Some(0));
        assert!(reg.is_busy(&"a", Some("rows".into())));

        drop(s);
        assert!(!reg.is_busy(&"a", Some("rows".into())));
    }

    #[tokio::test]
    async fn error_items_pass_through() {
        let reg: Registry<&'static str> = Registry::new();
        let items: Vec<Result<u8, &str>> = vec![Ok(1), Err("bad row")];
        let out: Vec<Result<u8, &str>> = reg
            .wrap_stream(stream::iter(items), &"a", None)
            .collect()
            .await;
        assert_eq!(out, vec![Ok(1), Err("bad row")]);
        assert!(!reg.is_busy(&"a", None));
    }
}
