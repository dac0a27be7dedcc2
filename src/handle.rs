//! A cloneable, thread-safe handle around a finished [`Policy`], with
//! helpers for running sanitize calls on tokio's blocking pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, SanitizeError};
use crate::policy::Policy;
use crate::sanitizer::Sanitizer;

/// Shared, read-only access to a [`Policy`].
///
/// Building the handle consumes the policy, so it can no longer be changed.
/// Cloning is cheap and every clone sanitizes with the same rules.
///
/// # Example
///
/// ```rust,no_run
/// use html_policy::{Policy, SanitizerHandle};
/// use std::time::Duration;
///
/// # async fn example() -> html_policy::Result<()> {
/// let handle = SanitizerHandle::from(Policy::ugc());
///
/// let clean = handle
///     .sanitize_with_timeout("<p onclick=x()>hi</p>".to_string(), Duration::from_secs(1))
///     .await?;
/// assert_eq!(clean, "<p>hi</p>");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SanitizerHandle {
    policy: Arc<Policy>,
}

impl SanitizerHandle {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    /// The policy behind this handle.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Sanitize on the current thread. See [`Policy::sanitize`].
    pub fn sanitize(&self, html: &str) -> String {
        self.policy.sanitize(html)
    }

    /// Sanitize on tokio's blocking pool, keeping large inputs off the
    /// async worker threads.
    pub async fn sanitize_blocking(&self, html: String) -> Result<String> {
        let policy = Arc::clone(&self.policy);
        tokio::task::spawn_blocking(move || policy.try_sanitize(&html))
            .await
            .map_err(|e| SanitizeError::TaskFailed(e.to_string()))?
    }

    /// Like [`sanitize_blocking`](Self::sanitize_blocking), but gives up
    /// after `timeout`.
    ///
    /// The blocking task is not interrupted; its result is discarded.
    pub async fn sanitize_with_timeout(&self, html: String, timeout: Duration) -> Result<String> {
        match tokio::time::timeout(timeout, self.sanitize_blocking(html)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Sanitize call timed out after {timeout:?}");
                Err(SanitizeError::Timeout(timeout))
            }
        }
    }

    /// Read all of `reader` and sanitize it on the blocking pool.
    pub async fn sanitize_async_reader<R>(&self, mut reader: R) -> Result<String>
    where
        R: AsyncRead + Unpin,
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let policy = Arc::clone(&self.policy);
        tokio::task::spawn_blocking(move || policy.sanitize_bytes(&bytes))
            .await
            .map_err(|e| SanitizeError::TaskFailed(e.to_string()))?
    }
}

impl From<Policy> for SanitizerHandle {
    fn from(policy: Policy) -> Self {
        Self::new(policy)
    }
}

impl Sanitizer for SanitizerHandle {
    fn sanitize(&self, html: &str) -> String {
        self.policy.sanitize(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> SanitizerHandle {
        let mut policy = Policy::new();
        policy.allow_elements(&["b"]);
        SanitizerHandle::from(policy)
    }

    #[test]
    fn clones_share_policy() {
        let a = handle();
        let b = a.clone();
        assert!(std::ptr::eq(a.policy(), b.policy()));
        assert_eq!(b.sanitize("<b>x</b><i>y</i>"), "<b>x</b>y");
    }

    #[tokio::test]
    async fn blocking_sanitize() {
        let out = handle()
            .sanitize_blocking("<b onclick=x>hi</b>".into())
            .await
            .unwrap();
        assert_eq!(out, "<b>hi</b>");
    }

    #[tokio::test]
    async fn generous_timeout_succeeds() {
        let out = handle()
            .sanitize_with_timeout("<b>ok</b>".into(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out, "<b>ok</b>");
    }

    #[tokio::test]
    async fn async_reader() {
        let input: &[u8] = b"<b>async</b><script>x</script>";
        let out = handle().sanitize_async_reader(input).await.unwrap();
        assert_eq!(out, "<b>async</b>");
    }
}
