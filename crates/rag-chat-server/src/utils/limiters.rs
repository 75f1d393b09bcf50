use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Process-wide cap on concurrent completion calls
#[derive(Clone)]
pub struct Limiters {
    pub llm_generate: Arc<Semaphore>,
    pub acquire_timeout: Duration,
}

impl Limiters {
    pub fn new(cfg: &crate::config::LimitsConfig) -> Self {
        Self {
            llm_generate: Arc::new(Semaphore::new(cfg.llm_concurrency.max(1))),
            acquire_timeout: Duration::from_millis(cfg.acquire_timeout_ms.max(1)),
        }
    }

    pub async fn acquire_llm(&self) -> Result<(OwnedSemaphorePermit, Duration)> {
        Self::acquire_timed(self.llm_generate.clone(), self.acquire_timeout, "llm_generate").await
    }

    pub async fn acquire_timed(
        sem: Arc<Semaphore>,
        acquire_timeout: Duration,
        op: &'static str,
    ) -> Result<(OwnedSemaphorePermit, Duration)> {
        let start = Instant::now();

        let permit = tokio::time::timeout(acquire_timeout, sem.acquire_owned())
            .await
            .map_err(|_| anyhow::anyhow!("Limiter acquire timeout for op={}", op))??;

        Ok((permit, start.elapsed()))
    }
}

impl Default for Limiters {
    fn default() -> Self {
        Self::new(&crate::config::LimitsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;

    #[tokio::test]
    async fn test_acquire_times_out_when_exhausted() {
        let limiters = Limiters::new(&LimitsConfig {
            llm_concurrency: 1,
            acquire_timeout_ms: 20,
            ..LimitsConfig::default()
        });

        let (_held, _) = limiters.acquire_llm().await.unwrap();
        let err = limiters.acquire_llm().await.unwrap_err();
        assert!(err.to_string().contains("llm_generate"));
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let limiters = Limiters::new(&LimitsConfig {
            llm_concurrency: 1,
            acquire_timeout_ms: 20,
            ..LimitsConfig::default()
        });

        {
            let _permit = limiters.acquire_llm().await.unwrap();
        }
        assert!(limiters.acquire_llm().await.is_ok());
    }
}
