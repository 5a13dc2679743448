use crate::config::suite_config::SuiteConfig;
use crate::utils::error::{E2eError, Result};
use std::future::Future;
use std::time::{Duration, Instant};

/// 固定期限的輪詢，用來等待非同步索引等遠端狀態
///
/// 不做 backoff；每次嘗試之間固定等待 `interval`，超過 `timeout` 即失敗。
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Poller {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn from_config(config: &SuiteConfig) -> Self {
        Self::new(config.poll_timeout(), config.poll_interval())
    }

    /// 反覆呼叫 `check` 直到回傳 `Some`；check 的錯誤會直接中止輪詢
    pub async fn until<T, F, Fut>(&self, what: &str, mut check: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let started = Instant::now();
        // timeout 大到無法表示時視為沒有期限
        let deadline = started.checked_add(self.timeout);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if let Some(value) = check().await? {
                tracing::debug!(
                    "⏱️ {} ready after {} attempt(s), {:?}",
                    what,
                    attempts,
                    started.elapsed()
                );
                return Ok(value);
            }

            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                tracing::warn!("⏱️ Gave up waiting for {} after {} attempt(s)", what, attempts);
                return Err(E2eError::PollTimeout {
                    what: what.to_string(),
                    waited_ms: started.elapsed().as_millis(),
                });
            }

            let wait = match deadline {
                Some(deadline) => self.interval.min(deadline - now),
                None => self.interval,
            };
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_until_returns_when_ready() {
        let poller = Poller::new(Duration::from_secs(2), Duration::from_millis(10));
        let calls = &AtomicU32::new(0);

        let value = poller
            .until("third attempt", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(if n >= 3 { Some(n) } else { None })
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_until_times_out() {
        let poller = Poller::new(Duration::from_millis(50), Duration::from_millis(10));
        let calls = &AtomicU32::new(0);

        let result: Result<()> = poller
            .until("never", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await;

        match result {
            Err(E2eError::PollTimeout { what, .. }) => assert_eq!(what, "never"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_zero_timeout_still_checks_once() {
        let poller = Poller::new(Duration::ZERO, Duration::from_millis(10));
        let value = poller.until("immediate", || async { Ok(Some(1)) }).await.unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_does_not_panic() {
        let poller = Poller::new(Duration::MAX, Duration::from_millis(5));
        let calls = &AtomicU32::new(0);

        let value = poller
            .until("huge timeout", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok((n >= 2).then_some(n))
            })
            .await
            .unwrap();

        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_check_error_aborts() {
        let poller = Poller::new(Duration::from_secs(1), Duration::from_millis(10));
        let result: Result<()> = poller
            .until("broken", || async { Err(E2eError::NoServiceSelected) })
            .await;
        assert!(matches!(result, Err(E2eError::NoServiceSelected)));
    }
}
