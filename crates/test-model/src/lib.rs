//! A local fake provider for testing purpose.

mod preset;

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde_json::{Value, json};
use switchyard_model::{
    ChatModel, ChatModelRef, ClientPolicy, Env, Error, LiveResource,
    LlmConfig, LlmProvider, ModelRequest, ModelSettings, ResourceSlot,
};
use tokio::time::sleep;

pub use preset::*;

/// The value behind the fake live resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TestClient {
    /// A serial number unique within one [`TestModelProvider`].
    pub serial: u64,
}

/// Counters shared by a provider and everything it creates.
#[derive(Debug, Default)]
pub struct TestStats {
    next_serial: AtomicU64,
    policies: AtomicUsize,
    created: AtomicUsize,
    released: AtomicUsize,
    close_failures: AtomicUsize,
}

impl TestStats {
    /// Number of policies handed out.
    #[inline]
    pub fn policies(&self) -> usize {
        self.policies.load(Ordering::SeqCst)
    }

    /// Number of resources created.
    #[inline]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of resources closed by their policy, including failed closes.
    #[inline]
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of closes that reported an error.
    #[inline]
    pub fn close_failures(&self) -> usize {
        self.close_failures.load(Ordering::SeqCst)
    }

    /// Number of resources created but not released yet.
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.created() - self.released()
    }
}

/// A fake provider family.
///
/// The provider counts every policy, resource and release in a shared
/// [`TestStats`], and can be told to be slow or to fail at a given step
/// with a [`PresetBehavior`].
///
/// # Note
///
/// This type is not meant for production use, it never talks to a
/// network.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    behavior: PresetBehavior,
    stats: Arc<TestStats>,
}

impl TestModelProvider {
    /// Creates a provider with the given behavior.
    #[inline]
    pub fn with_behavior(behavior: PresetBehavior) -> Self {
        Self {
            behavior,
            stats: Default::default(),
        }
    }

    /// Returns the shared counters.
    #[inline]
    pub fn stats(&self) -> Arc<TestStats> {
        Arc::clone(&self.stats)
    }
}

impl LlmProvider for TestModelProvider {
    type Policy = TestClientPolicy;

    fn create_policy(&self) -> Option<Self::Policy> {
        if self.behavior.resource_free {
            return None;
        }
        self.stats.policies.fetch_add(1, Ordering::SeqCst);
        Some(TestClientPolicy {
            behavior: self.behavior.clone(),
            stats: Arc::clone(&self.stats),
            slot: ResourceSlot::default(),
        })
    }

    fn create_model(
        &self,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        _env: &Env,
    ) -> Result<ChatModelRef, Error> {
        if let Some(kind) =
            self.behavior.failure_at(FailurePoint::CreateModel)
        {
            return Err(Error::new(kind, "preset model failure"));
        }
        let settings = ModelSettings {
            model_name: config.model_name.clone().unwrap_or_default(),
            temperature: config.temperature,
            top_p: config.top_p,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
            seed: config.seed,
            stop: config.stop.clone(),
            max_tokens: config.max_tokens,
            streaming: true,
            stream_usage: true,
            n: Some(1),
            reasoning: config.reasoning.clone(),
            reasoning_effort: config.reasoning_effort.clone(),
            verbosity: config.verbosity.clone(),
            verbose: config.verbose,
        };
        Ok(Arc::new(TestChatModel {
            class: config
                .class_identifier()
                .unwrap_or_else(|| "test".to_owned()),
            settings,
            resource: resource.cloned(),
        }))
    }
}

/// The policy of [`TestModelProvider`].
pub struct TestClientPolicy {
    behavior: PresetBehavior,
    stats: Arc<TestStats>,
    slot: ResourceSlot,
}

impl ClientPolicy for TestClientPolicy {
    async fn create_resource(
        &mut self,
        _config: &LlmConfig,
        _env: &Env,
    ) -> Result<LiveResource, Error> {
        self.slot.ensure_empty("TestClientPolicy")?;

        let serial = self.stats.next_serial.fetch_add(1, Ordering::SeqCst);
        let close_failure =
            self.behavior.failure_at(FailurePoint::CloseResource);
        let resource = LiveResource::with_close_hook(
            "test",
            TestClient { serial },
            move |_| match close_failure {
                Some(kind) => Err(Error::new(kind, "preset close failure")),
                None => Ok(()),
            },
        );
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        let resource = self.slot.fill("TestClientPolicy", resource)?;

        // Past this point the slot owns the resource.
        if let Some(delay) = self.behavior.create_delay {
            sleep(delay).await;
        }
        if let Some(kind) =
            self.behavior.failure_at(FailurePoint::CreateResource)
        {
            return Err(Error::new(kind, "preset resource failure"));
        }
        Ok(resource)
    }

    async fn release_resource(&mut self) {
        let Some(resource) = self.slot.take() else {
            return;
        };
        self.stats.released.fetch_add(1, Ordering::SeqCst);
        if resource.close().is_err() {
            // Counted, never returned.
            self.stats.close_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn resource(&self) -> Option<&LiveResource> {
        self.slot.get()
    }
}

/// The model object of [`TestModelProvider`].
#[derive(Debug)]
pub struct TestChatModel {
    class: String,
    settings: ModelSettings,
    resource: Option<LiveResource>,
}

impl TestChatModel {
    /// Returns the fake client, or `None` once the resource is released.
    #[inline]
    pub fn client(&self) -> Option<TestClient> {
        self.resource.as_ref()?.get()
    }
}

impl ChatModel for TestChatModel {
    fn class(&self) -> &str {
        &self.class
    }

    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn resource(&self) -> Option<&LiveResource> {
        self.resource.as_ref()
    }

    fn request_body(&self, req: &ModelRequest) -> Value {
        json!({
            "model": self.settings.model_name,
            "messages": req.messages.len(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use switchyard_model::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn test_counts() {
        let provider = TestModelProvider::default();
        let stats = provider.stats();
        let config = LlmConfig::default().with_model_name("fake");

        let mut policy = provider.create_policy().unwrap();
        let resource =
            policy.create_resource(&config, &Env::empty()).await.unwrap();
        let model = provider
            .create_model(&config, Some(&resource), &Env::empty())
            .unwrap();
        let model = model.downcast_ref::<TestChatModel>().unwrap();
        assert_eq!(model.client(), Some(TestClient { serial: 0 }));
        assert_eq!(stats.outstanding(), 1);

        policy.release_resource().await;
        policy.release_resource().await;
        assert_eq!(stats.released(), 1);
        assert_eq!(stats.outstanding(), 0);
        assert_eq!(model.client(), None);
    }

    #[tokio::test]
    async fn test_close_failure_is_swallowed() {
        let provider = TestModelProvider::with_behavior(PresetBehavior {
            failures: vec![Failure {
                point: FailurePoint::CloseResource,
                kind: ErrorKind::Other,
            }],
            ..Default::default()
        });
        let stats = provider.stats();
        let mut policy = provider.create_policy().unwrap();
        policy
            .create_resource(&LlmConfig::default(), &Env::empty())
            .await
            .unwrap();
        policy.release_resource().await;
        assert_eq!(stats.close_failures(), 1);
        assert_eq!(stats.outstanding(), 0);
    }

    #[test]
    fn test_resource_free() {
        let provider = TestModelProvider::with_behavior(PresetBehavior {
            resource_free: true,
            ..Default::default()
        });
        assert!(provider.create_policy().is_none());
        assert_eq!(provider.stats().policies(), 0);
    }
}
