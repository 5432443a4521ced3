use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};

/// Rate-limited task queue: runs jobs with at most `concurrency` in flight and
/// pauses after each one. Outputs come back in submission order.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    concurrency: usize,
    jitter_ms: u64,
}

impl Pacer {
    pub fn new(concurrency: usize, jitter_ms: u64) -> Self {
        Self {
            concurrency: concurrency.max(1),
            jitter_ms,
        }
    }

    pub async fn run<I, F, Fut, T>(&self, jobs: I, delay: Duration, job: F) -> Vec<T>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        stream::iter(jobs)
            .map(job)
            .map(|fut| async move {
                let out = fut.await;
                self.pause(delay).await;
                out
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn pause(&self, delay: Duration) {
        let jitter = if self.jitter_ms > 0 {
            Duration::from_millis(fastrand::u64(..=self.jitter_ms))
        } else {
            Duration::ZERO
        };
        let total = delay + jitter;
        if !total.is_zero() {
            tokio::time::sleep(total).await;
        }
    }
}
