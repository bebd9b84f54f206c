//! Live-feed plumbing: cancellable monitors that poll the hosted store
//! and deliver complete snapshots over a channel.

use std::{future::Future, sync::mpsc::Sender, time::Duration};

use tokio::{runtime::Handle, sync::watch};

use crate::usecases::sync_conversations::FeedHandle;

const FEED_MONITOR_STARTED: &str = "BACKEND_FEED_MONITOR_STARTED";
const FEED_MONITOR_STOPPED: &str = "BACKEND_FEED_MONITOR_STOPPED";
const FEED_MONITOR_POLL_FAILED: &str = "BACKEND_FEED_MONITOR_POLL_FAILED";
const FEED_MONITOR_CHANNEL_CLOSED: &str = "BACKEND_FEED_MONITOR_CHANNEL_CLOSED";

/// Why a poll failed; forwarded to the consumer as the feed-lost code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFetchError {
    pub code: &'static str,
    pub message: String,
}

/// What a feed delivers: either a complete current snapshot, or a
/// terminal transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent<T> {
    Snapshot(Vec<T>),
    Lost { code: String },
}

/// A polling subscription to one store query. Each successful poll sends
/// the full current snapshot; the first failed poll sends `Lost` and ends
/// the subscription (no automatic retry). Cancellation is explicit via
/// `FeedHandle::cancel`, and Drop cancels as a backstop.
#[derive(Debug)]
pub struct SnapshotMonitor {
    name: &'static str,
    stop_tx: Option<watch::Sender<bool>>,
}

impl SnapshotMonitor {
    pub fn start<T, F, Fut>(
        handle: &Handle,
        name: &'static str,
        interval: Duration,
        fetch: F,
        update_tx: Sender<FeedEvent<T>>,
    ) -> Self
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<T>, SnapshotFetchError>> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        handle.spawn(run_monitor(name, interval, fetch, update_tx, stop_rx));

        tracing::info!(code = FEED_MONITOR_STARTED, feed = name, "feed monitor started");

        Self {
            name,
            stop_tx: Some(stop_tx),
        }
    }
}

impl FeedHandle for SnapshotMonitor {
    fn cancel(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
            tracing::info!(
                code = FEED_MONITOR_STOPPED,
                feed = self.name,
                "feed monitor stop signal sent"
            );
        }
    }
}

impl Drop for SnapshotMonitor {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_monitor<T, F, Fut>(
    name: &'static str,
    interval: Duration,
    mut fetch: F,
    update_tx: Sender<FeedEvent<T>>,
    mut stop_rx: watch::Receiver<bool>,
) where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<T>, SnapshotFetchError>> + Send,
{
    loop {
        match fetch().await {
            Ok(snapshot) => {
                tracing::debug!(feed = name, records = snapshot.len(), "feed snapshot delivered");
                if update_tx.send(FeedEvent::Snapshot(snapshot)).is_err() {
                    tracing::warn!(
                        code = FEED_MONITOR_CHANNEL_CLOSED,
                        feed = name,
                        "feed consumer gone; stopping monitor"
                    );
                    return;
                }
            }
            Err(error) => {
                tracing::warn!(
                    code = FEED_MONITOR_POLL_FAILED,
                    feed = name,
                    source_code = error.code,
                    error = %error.message,
                    "feed poll failed; subscription ends"
                );
                let _ = update_tx.send(FeedEvent::Lost {
                    code: error.code.to_owned(),
                });
                return;
            }
        }

        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    tracing::info!(code = FEED_MONITOR_STOPPED, feed = name, "feed monitor stopped");
                    return;
                }
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
