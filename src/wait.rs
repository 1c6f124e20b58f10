use crate::browser::{BrowserSession, Locator, PageElement};
use crate::config::RunConfig;
use crate::error::{CareersError, Result};
use log::debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

impl From<&RunConfig> for WaitConfig {
    fn from(config: &RunConfig) -> Self {
        Self::new(config.wait_timeout(), config.poll_interval())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementCondition {
    Present,
    Visible,
    Clickable,
}

/// Polls `probe` until it yields a value or the deadline passes.
///
/// The probe is always tried at least once. Errors from the probe end the wait
/// immediately.
pub async fn wait_until<T, F, Fut>(wait: WaitConfig, what: &str, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + wait.timeout;
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(CareersError::Timeout {
                what: what.to_string(),
                timeout: wait.timeout,
            });
        }
        tokio::time::sleep(wait.poll_interval).await;
    }
}

pub async fn wait_for_element<S>(
    session: &S,
    locator: &Locator,
    condition: ElementCondition,
    wait: WaitConfig,
) -> Result<S::Element>
where
    S: BrowserSession + ?Sized,
{
    let what = format!("{} ({:?})", locator, condition);
    debug!("Waiting up to {:?} for {}", wait.timeout, what);

    wait_until(wait, &what, move || probe_element(session, locator, condition)).await
}

async fn probe_element<S>(
    session: &S,
    locator: &Locator,
    condition: ElementCondition,
) -> Result<Option<S::Element>>
where
    S: BrowserSession + ?Sized,
{
    let Some(element) = session.find_element(locator).await? else {
        return Ok(None);
    };
    let satisfied = match condition {
        ElementCondition::Present => true,
        ElementCondition::Visible => element.is_displayed().await?,
        ElementCondition::Clickable => element.is_displayed().await? && element.is_enabled().await?,
    };
    Ok(satisfied.then_some(element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_wait_until_returns_first_value() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let wait = WaitConfig::new(Duration::from_secs(1), Duration::from_millis(5));
        let value = wait_until(wait, "counter", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok((n == 2).then_some(n))
        })
        .await
        .unwrap();
        assert_eq!(value, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_wait_until_times_out() {
        let wait = WaitConfig::new(Duration::from_millis(30), Duration::from_millis(5));
        let result: Result<()> = wait_until(wait, "nothing", || async { Ok(None) }).await;
        match result {
            Err(CareersError::Timeout { what, timeout }) => {
                assert_eq!(what, "nothing");
                assert_eq!(timeout, Duration::from_millis(30));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_until_propagates_probe_error() {
        let wait = WaitConfig::new(Duration::from_secs(1), Duration::from_millis(5));
        let result: Result<()> = wait_until(wait, "broken", || async {
            Err(CareersError::Navigation("gone".to_string()))
        })
        .await;
        assert!(matches!(result, Err(CareersError::Navigation(_))));
    }
}
