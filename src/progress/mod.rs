// src/progress/mod.rs

//! Rate-annotated progress sampling.
//!
//! A `ProgressMonitor` samples a [`MetricSource`] once per interval on its
//! own Tokio task and sends `ProgressEvent`s over an unbounded channel:
//!
//! - the first sample has `rate = 0`;
//! - later samples have `rate = (count_now - count_prev) / interval`;
//! - [`ProgressMonitor::stop`] takes one last sample and emits it as the
//!   terminal event;
//! - [`ProgressMonitor::abort`] (or dropping the monitor) stops sampling
//!   at once and emits nothing more.

pub mod source;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::types::ProgressEvent;

pub use source::{ByteSize, LineCount, MetricSource};

#[derive(Debug)]
pub struct ProgressMonitor {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressMonitor {
    /// Start sampling `source` every `every`.
    pub fn start(
        source: Arc<dyn MetricSource>,
        every: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();

        let handle = tokio::spawn(sample_loop(source, every, event_tx, stop_rx));

        (
            Self {
                stop_tx: Some(stop_tx),
                handle: Some(handle),
            },
            event_rx,
        )
    }

    /// Emit the terminal event and wait for the sampler to finish.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                debug!(error = %e, "progress sampler ended abnormally");
            }
        }
    }

    /// Stop immediately without a terminal event.
    pub fn abort(mut self) {
        self.abort_inner();
    }

    fn abort_inner(&mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        self.abort_inner();
    }
}

async fn sample_loop(
    source: Arc<dyn MetricSource>,
    every: Duration,
    events: mpsc::UnboundedSender<ProgressEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut prev: Option<u64> = None;

    loop {
        tokio::select! {
            biased;

            stop = &mut stop_rx => {
                // A dropped sender means abort: no terminal event.
                if stop.is_ok() {
                    let event = next_event(sample(&source).await, &mut prev, every);
                    let _ = events.send(event);
                }
                break;
            }

            _ = ticker.tick() => {
                let event = next_event(sample(&source).await, &mut prev, every);
                if events.send(event).is_err() {
                    break;
                }
            }
        }
    }
}

async fn sample(source: &Arc<dyn MetricSource>) -> u64 {
    let source = Arc::clone(source);
    tokio::task::spawn_blocking(move || source.sample())
        .await
        .unwrap_or(0)
}

/// Fold a raw sample into the next event. Counts never go backwards.
fn next_event(raw: u64, prev: &mut Option<u64>, every: Duration) -> ProgressEvent {
    let event = match *prev {
        None => ProgressEvent { count: raw, rate: 0.0 },
        Some(p) => {
            let count = raw.max(p);
            ProgressEvent {
                count,
                rate: (count - p) as f64 / every.as_secs_f64(),
            }
        }
    };
    *prev = Some(event.count);
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_has_zero_rate() {
        let mut prev = None;
        let e = next_event(40, &mut prev, Duration::from_secs(2));
        assert_eq!(e, ProgressEvent { count: 40, rate: 0.0 });
    }

    #[test]
    fn rate_is_delta_over_interval() {
        let mut prev = Some(40);
        let e = next_event(100, &mut prev, Duration::from_secs(2));
        assert_eq!(e.count, 100);
        assert!((e.rate - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn count_never_decreases() {
        let mut prev = Some(100);
        let e = next_event(10, &mut prev, Duration::from_secs(1));
        assert_eq!(e, ProgressEvent { count: 100, rate: 0.0 });
    }
}
