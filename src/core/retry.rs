//! Rate-limit retry policy shared by every provider gateway.
//!
//! On a rate-limited response the call is retried exactly once after a fixed
//! cooldown; a second rate limit propagates to the caller. Back-off state is
//! local to each call, never shared across concurrent requests.

use std::future::Future;
use std::time::Duration;

use crate::core::errors::RagError;

/// Run `op`, and if it fails with `RagError::RateLimited`, sleep for
/// `cooldown` and run it once more. Any other error returns immediately.
pub async fn retry_on_rate_limit<T, F, Fut>(cooldown: Duration, op: F) -> Result<T, RagError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RagError>>,
{
    match op().await {
        Err(err) if err.is_rate_limit() => {
            tracing::warn!(
                "provider rate limited, retrying once after {:?}: {}",
                cooldown,
                err
            );
            tokio::time::sleep(cooldown).await;
            op().await
        }
        other => other,
    }
}
