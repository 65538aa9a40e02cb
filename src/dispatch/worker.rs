//! Consume loop shared by the workers.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinSet;

use crate::bus::{Message, Subscription};
use crate::lifecycle::ShutdownSignal;

/// Spawn `handler` for every message on `subscription` until shutdown or the
/// stream ends, then wait up to `drain_timeout` for in-flight tasks.
pub(crate) async fn consume<F, Fut>(
    worker: &str,
    mut subscription: Subscription,
    mut shutdown: ShutdownSignal,
    drain_timeout: Duration,
    mut handler: F,
) where
    F: FnMut(Message) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::info!(worker = %worker, in_flight = tasks.len(), "Shutdown signal received, stopping consumption");
                break;
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(worker = %worker, error = %e, "Message task failed");
                }
            }
            next = subscription.next() => match next {
                Some(message) => {
                    tasks.spawn(handler(message));
                }
                None => {
                    tracing::warn!(worker = %worker, "Subscription closed");
                    break;
                }
            },
        }
    }

    drop(subscription);
    drain(worker, &mut tasks, drain_timeout).await;
}

async fn drain(worker: &str, tasks: &mut JoinSet<()>, timeout: Duration) {
    if tasks.is_empty() {
        return;
    }

    let drained = tokio::time::timeout(timeout, async {
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(worker = %worker, error = %e, "Message task failed");
            }
        }
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            worker = %worker,
            remaining = tasks.len(),
            timeout = ?timeout,
            "Drain timeout elapsed, aborting in-flight tasks"
        );
        tasks.abort_all();
    }
}
