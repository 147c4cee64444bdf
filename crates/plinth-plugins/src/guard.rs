//! Wraps plugin hook invocations: attributes failures to the plugin and
//! applies the optional hook timeout.

use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;

use crate::error::{HookResult, PluginError, PluginResult};
use crate::identifier::PluginIdentifier;
use crate::plugin::LifecycleHook;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HookGuard {
    timeout: Option<Duration>,
}

impl HookGuard {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Await `fut`, failing with [`Elapsed`] if the timeout is set and runs out.
    pub(crate) async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut).await,
            None => Ok(fut.await),
        }
    }

    /// Run one plugin hook.
    pub(crate) async fn run<T, F>(
        &self,
        identifier: &PluginIdentifier,
        hook: LifecycleHook,
        fut: F,
    ) -> PluginResult<T>
    where
        F: Future<Output = HookResult<T>>,
    {
        let result = self.bounded(fut).await.map_err(|_| PluginError::HookTimedOut {
            identifier: identifier.clone(),
            hook,
            timeout: self.timeout.unwrap_or_default(),
        })?;
        result.map_err(|source| PluginError::HookFailed {
            identifier: identifier.clone(),
            hook,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_wraps_failure() {
        let guard = HookGuard::default();
        let id = PluginIdentifier::with_default_id("docs");
        let err = guard
            .run(&id, LifecycleHook::LoadContent, async {
                Err::<(), _>("disk on fire".into())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PluginError::HookFailed {
                hook: LifecycleHook::LoadContent,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let guard = HookGuard::new(Some(Duration::from_secs(5)));
        let id = PluginIdentifier::with_default_id("slow");
        let err = guard
            .run(&id, LifecycleHook::ContentLoaded, async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PluginError::HookTimedOut { timeout, .. } if timeout == Duration::from_secs(5)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timeout_waits() {
        let guard = HookGuard::default();
        let id = PluginIdentifier::with_default_id("slow");
        let value = guard
            .run(&id, LifecycleHook::LoadContent, async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
