//! Identifier and polling helpers.

use crate::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Default interval between two checks of [`await_condition`].
pub const DEFAULT_AWAIT_INTERVAL: Duration = Duration::from_secs(1);

/// Random identifier (hex form of a v4 UUID, without dashes).
pub fn uuid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Poll `condition` every second until it yields `true`.
///
/// Fails with [`Error::Timeout`] once `timeout` has elapsed, or with the
/// condition's own error as soon as it returns one.
pub async fn await_condition<F, Fut>(condition: F, timeout: Duration) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    await_condition_with(condition, timeout, DEFAULT_AWAIT_INTERVAL, false).await
}

/// Poll `condition` every `interval` until it yields `true`.
///
/// With `ignore_errors` an error from the condition counts as "not yet" and
/// polling continues until the timeout.
pub async fn await_condition_with<F, Fut>(
    mut condition: F,
    timeout: Duration,
    interval: Duration,
    ignore_errors: bool,
) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match condition().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) if ignore_errors => {
                tracing::debug!("Ignoring error while awaiting condition: {e:#}");
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Timeout(timeout).into());
        }
        sleep(interval.min(deadline - now)).await;
    }
}
