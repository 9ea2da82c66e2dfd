// Throttled fan-out for per-player upstream requests.
//
// Items are processed in fixed-size batches: every request in a batch runs
// concurrently under its own timeout, then the pipeline pauses before the
// next batch. One failed or slow item never sinks the batch.

use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::upstream::UpstreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub pause: Duration,
    pub item_timeout: Duration,
}

/// Run `fetch` for every id, `batch_size` at a time, pausing between
/// batches. Results come back in input order.
pub async fn process_in_batches<T, F, Fut>(
    ids: &[u32],
    policy: BatchPolicy,
    fetch: F,
) -> Vec<(u32, Result<T, UpstreamError>)>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let batch_size = policy.batch_size.max(1);
    let batches = ids.len().div_ceil(batch_size);
    let mut results = Vec::with_capacity(ids.len());

    for (idx, chunk) in ids.chunks(batch_size).enumerate() {
        if idx > 0 && !policy.pause.is_zero() {
            tokio::time::sleep(policy.pause).await;
        }

        let calls = chunk.iter().map(|&id| {
            let fut = fetch(id);
            async move {
                let outcome = match tokio::time::timeout(policy.item_timeout, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(UpstreamError::Timeout {
                        what: format!("player {id}"),
                        millis: policy.item_timeout.as_millis() as u64,
                    }),
                };
                (id, outcome)
            }
        });

        for (id, outcome) in join_all(calls).await {
            if let Err(e) = &outcome {
                warn!(player_id = id, error = %e, "player request failed");
            }
            results.push((id, outcome));
        }
        debug!(batch = idx + 1, of = batches, "batch complete");
    }

    results
}
