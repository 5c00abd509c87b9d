use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use switchyard_model::ChatModelRef;
use tokio::runtime::Handle;
use tokio::time::timeout;

use crate::ResourcePolicy;

/// A model object paired with the policy that owns its live resource.
///
/// The handle is created once per factory call and must be torn down by
/// its owner with [`delete_resources`](Self::delete_resources) once the
/// model object is out of use. The factory never tears it down.
pub struct LlmResources {
    model: ChatModelRef,
    policy: Option<ResourcePolicy>,
}

impl LlmResources {
    #[inline]
    pub(crate) fn new(
        model: ChatModelRef,
        policy: Option<ResourcePolicy>,
    ) -> Self {
        Self { model, policy }
    }

    /// Returns the model object.
    #[inline]
    pub fn model(&self) -> &ChatModelRef {
        &self.model
    }

    /// Returns the policy, or `None` if the provider needs no managed
    /// resource.
    #[inline]
    pub fn policy(&self) -> Option<&ResourcePolicy> {
        self.policy.as_ref()
    }

    /// Splits the handle, moving the teardown duty to the caller.
    #[inline]
    pub fn into_parts(self) -> (ChatModelRef, Option<ResourcePolicy>) {
        (self.model, self.policy)
    }

    /// Releases the live resource, if any.
    ///
    /// The model object may still be referenced elsewhere, but requests
    /// made with it will fail from now on.
    pub async fn delete_resources(self) {
        if let Some(mut policy) = self.policy {
            policy.release_resource().await;
        }
    }

    /// Like [`delete_resources`](Self::delete_resources), but gives up
    /// after `limit`. The policy is dropped either way.
    pub async fn delete_resources_with_timeout(self, limit: Duration) {
        let Some(mut policy) = self.policy else {
            return;
        };
        if timeout(limit, policy.release_resource()).await.is_err() {
            warn!(
                "releasing resources of model `{}` timed out after {limit:?}",
                self.model.settings().model_name
            );
        }
    }
}

impl Debug for LlmResources {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmResources")
            .field("model", &self.model)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Releases the policy it holds unless disarmed.
///
/// Dropping an armed guard, for example when the caller abandons a
/// pending factory call, spawns the release on the current runtime.
pub(crate) struct PolicyGuard {
    policy: Option<ResourcePolicy>,
}

impl PolicyGuard {
    #[inline]
    pub fn new(policy: Option<ResourcePolicy>) -> Self {
        Self { policy }
    }

    #[inline]
    pub fn policy_mut(&mut self) -> Option<&mut ResourcePolicy> {
        self.policy.as_mut()
    }

    #[inline]
    pub fn disarm(mut self) -> Option<ResourcePolicy> {
        self.policy.take()
    }

    /// Releases the policy, giving up after `limit`.
    pub async fn release(mut self, limit: Duration) {
        let Some(mut policy) = self.policy.take() else {
            return;
        };
        if timeout(limit, policy.release_resource()).await.is_err() {
            warn!(
                "releasing a half-created resource timed out after {limit:?}"
            );
        }
    }
}

impl Drop for PolicyGuard {
    fn drop(&mut self) {
        let Some(mut policy) = self.policy.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                debug!("resource creation abandoned, releasing in background");
                handle.spawn(async move {
                    policy.release_resource().await;
                });
            }
            Err(_) => {
                warn!(
                    "resource creation abandoned outside of a runtime, \
                     the policy is dropped without releasing"
                );
            }
        }
    }
}
