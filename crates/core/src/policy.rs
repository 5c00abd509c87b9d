use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::pin::Pin;
use std::sync::Arc;

use switchyard_model::{
    ChatModelRef, ClientPolicy, Env, Error, LiveResource, LlmConfig,
    LlmProvider,
};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub(crate) trait PolicyObject: Send + 'static {
    fn create_resource<'a>(
        &'a mut self,
        config: &'a LlmConfig,
        env: &'a Env,
    ) -> BoxFuture<'a, Result<LiveResource, Error>>;

    fn release_resource(&mut self) -> BoxFuture<'_, ()>;

    fn resource(&self) -> Option<&LiveResource>;

    fn as_any(&self) -> &dyn Any;
}

struct PolicyObjectImpl<P: ClientPolicy>(P);

impl<P: ClientPolicy> PolicyObject for PolicyObjectImpl<P> {
    #[inline]
    fn create_resource<'a>(
        &'a mut self,
        config: &'a LlmConfig,
        env: &'a Env,
    ) -> BoxFuture<'a, Result<LiveResource, Error>> {
        Box::pin(self.0.create_resource(config, env))
    }

    #[inline]
    fn release_resource(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(self.0.release_resource())
    }

    #[inline]
    fn resource(&self) -> Option<&LiveResource> {
        self.0.resource()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        &self.0
    }
}

pub(crate) trait ProviderObject: Send + Sync + 'static {
    fn create_policy(&self) -> Option<ResourcePolicy>;

    fn create_model(
        &self,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        env: &Env,
    ) -> Result<ChatModelRef, Error>;
}

pub(crate) struct ProviderObjectImpl<P: LlmProvider>(pub P);

impl<P: LlmProvider> ProviderObject for ProviderObjectImpl<P> {
    #[inline]
    fn create_policy(&self) -> Option<ResourcePolicy> {
        let policy = self.0.create_policy()?;
        Some(ResourcePolicy {
            inner: Box::new(PolicyObjectImpl(policy)),
        })
    }

    #[inline]
    fn create_model(
        &self,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        env: &Env,
    ) -> Result<ChatModelRef, Error> {
        self.0.create_model(config, resource, env)
    }
}

pub(crate) type ProviderRef = Arc<dyn ProviderObject>;

/// A type-erased [`ClientPolicy`] owned by one [`LlmResources`] handle.
///
/// [`LlmResources`]: crate::LlmResources
pub struct ResourcePolicy {
    inner: Box<dyn PolicyObject>,
}

impl ResourcePolicy {
    pub(crate) async fn create_resource(
        &mut self,
        config: &LlmConfig,
        env: &Env,
    ) -> Result<LiveResource, Error> {
        self.inner.create_resource(config, env).await
    }

    /// Releases the live resource. Calling it more than once does nothing.
    pub async fn release_resource(&mut self) {
        self.inner.release_resource().await
    }

    /// Returns the live resource owned by the policy, if it's still active.
    #[inline]
    pub fn resource(&self) -> Option<&LiveResource> {
        self.inner.resource()
    }

    /// Converts the policy into its concrete type.
    #[inline]
    pub fn downcast_ref<P: ClientPolicy>(&self) -> Option<&P> {
        self.inner.as_any().downcast_ref()
    }
}

impl Debug for ResourcePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePolicy")
            .field("resource", &self.resource())
            .finish_non_exhaustive()
    }
}
