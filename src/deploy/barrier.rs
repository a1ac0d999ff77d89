//! Chain/worker synchronisation.

use crate::chain::ChainHead;
use crate::error::{Error, Result};
use crate::resilience::{retry_until, PollPolicy};
use crate::worker::WorkerApi;

/// Wait until the worker has processed the chain head observed on entry.
///
/// Returns the block number waited for.
pub async fn block_barrier<C, W>(chain: &C, worker: &W, policy: &PollPolicy) -> Result<u64>
where
    C: ChainHead + ?Sized,
    W: WorkerApi + ?Sized,
{
    let head = chain.block_number().await?;
    tracing::debug!(head, "Barrier: waiting for worker");
    let info = retry_until(
        policy,
        "worker synchronisation",
        || async move { Ok::<_, Error>(worker.get_info().await?) },
        |info| info.has_processed(head),
    )
    .await?;
    tracing::debug!(head, blocknum = info.blocknum, "Barrier: passed");
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DevnetConfig;
    use crate::devnet::DevnetBuilder;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_barrier_waits_for_worker_lag() {
        let devnet = DevnetBuilder::new(DevnetConfig {
            block_time_ms: 100,
            key_delay_blocks: 1,
            worker_lag_blocks: 3,
        })
        .build()
        .unwrap();
        tokio::time::sleep(Duration::from_millis(1_050)).await;

        let policy = PollPolicy::fixed(Duration::from_secs(5), Duration::from_millis(50));
        let started = tokio::time::Instant::now();
        let head = block_barrier(devnet.as_ref(), devnet.as_ref(), &policy).await.unwrap();
        assert_eq!(head, 10);
        // the worker reaches block 10 once the head is 13
        assert!(started.elapsed() >= Duration::from_millis(250));

        let info = devnet.get_info().await.unwrap();
        assert!(info.has_processed(head));
    }

    #[tokio::test(start_paused = true)]
    async fn test_barrier_times_out_on_stalled_worker() {
        let devnet = DevnetBuilder::new(DevnetConfig {
            block_time_ms: 100,
            key_delay_blocks: 1,
            worker_lag_blocks: 50,
        })
        .build()
        .unwrap();
        let policy = PollPolicy::fixed(Duration::from_millis(500), Duration::from_millis(100));
        let err = block_barrier(devnet.as_ref(), devnet.as_ref(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PollTimeout { .. }));
    }
}
