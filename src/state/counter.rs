//! Process-wide request counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request tally, starting at zero at process start.
///
/// `fetch_add` hands every caller a distinct value, so concurrent requests
/// never observe the same post-increment count. The counter is never reset
/// or persisted; overflow of the 64-bit range is an accepted limitation of
/// the service's operational lifetime.
#[derive(Debug, Default)]
pub struct RequestCounter {
    value: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the tally and return the value this call produced.
    pub fn increment_and_get(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current tally without incrementing.
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn starts_at_zero_and_increments() {
        let counter = RequestCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.increment_and_get(), 1);
        assert_eq!(counter.increment_and_get(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[tokio::test]
    async fn concurrent_increments_are_lossless() {
        let counter = Arc::new(RequestCounter::new());
        let mut tasks = Vec::new();
        for _ in 0..100 {
            let counter = counter.clone();
            tasks.push(tokio::spawn(async move { counter.increment_and_get() }));
        }

        let mut observed = HashSet::new();
        for task in tasks {
            observed.insert(task.await.unwrap());
        }

        // No duplicates, no gaps: exactly {1, ..., 100}.
        assert_eq!(observed, (1..=100).collect::<HashSet<u64>>());
        assert_eq!(counter.current(), 100);
    }
}
