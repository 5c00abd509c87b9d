use reqwest::{Client, Url};
use switchyard_model::{
    ClientPolicy, Env, Error, LiveResource, LlmConfig, ResourceSlot,
};

use crate::config::OpenAIClientConfig;

/// The live resource of the OpenAI-compatible providers: one async HTTP
/// client with the credentials in its default headers, plus the endpoint
/// it talks to.
#[derive(Clone, Debug)]
pub struct OpenAIClient {
    http: Client,
    chat_url: Url,
}

impl OpenAIClient {
    /// Opens a client from resolved settings.
    #[inline]
    pub fn open(config: &OpenAIClientConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.open()?,
            chat_url: config.chat_url().clone(),
        })
    }

    /// Returns the HTTP client.
    #[inline]
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Returns the chat completions URL.
    #[inline]
    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }
}

/// Client policy for the `openai` class.
#[derive(Debug, Default)]
pub struct OpenAIClientPolicy {
    slot: ResourceSlot,
}

impl OpenAIClientPolicy {
    const NAME: &str = "OpenAIClientPolicy";
}

impl ClientPolicy for OpenAIClientPolicy {
    async fn create_resource(
        &mut self,
        config: &LlmConfig,
        env: &Env,
    ) -> Result<LiveResource, Error> {
        self.slot.ensure_empty(Self::NAME)?;
        let client_config = OpenAIClientConfig::resolve_openai(config, env)?;
        open_into(&mut self.slot, Self::NAME, "openai", &client_config)
    }

    async fn release_resource(&mut self) {
        release_slot(&mut self.slot, Self::NAME);
    }

    fn resource(&self) -> Option<&LiveResource> {
        self.slot.get()
    }
}

/// Client policy for the `azure-openai` class.
#[derive(Debug, Default)]
pub struct AzureOpenAIClientPolicy {
    slot: ResourceSlot,
}

impl AzureOpenAIClientPolicy {
    const NAME: &str = "AzureOpenAIClientPolicy";
}

impl ClientPolicy for AzureOpenAIClientPolicy {
    async fn create_resource(
        &mut self,
        config: &LlmConfig,
        env: &Env,
    ) -> Result<LiveResource, Error> {
        self.slot.ensure_empty(Self::NAME)?;
        let client_config = OpenAIClientConfig::resolve_azure(config, env)?;
        open_into(&mut self.slot, Self::NAME, "azure-openai", &client_config)
    }

    async fn release_resource(&mut self) {
        release_slot(&mut self.slot, Self::NAME);
    }

    fn resource(&self) -> Option<&LiveResource> {
        self.slot.get()
    }
}

fn open_into(
    slot: &mut ResourceSlot,
    policy: &str,
    label: &str,
    config: &OpenAIClientConfig,
) -> Result<LiveResource, Error> {
    debug!("{policy} opening client: {config:?}");
    let client = OpenAIClient::open(config)?;
    slot.fill(policy, LiveResource::new(label, client))
}

fn release_slot(slot: &mut ResourceSlot, policy: &str) {
    let Some(resource) = slot.take() else {
        trace!("{policy} has nothing to release");
        return;
    };
    // Dropping the last client closes the pooled connections.
    match resource.close() {
        Ok(_) => debug!("{policy} released resource {}", resource.id()),
        Err(err) => {
            warn!("{policy} failed to close resource {}: {err}", resource.id())
        }
    }
}

#[cfg(test)]
mod tests {
    use switchyard_model::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn test_create_and_release() {
        let env = Env::from_pairs([("OPENAI_API_KEY", "sk-test")]);
        let mut policy = OpenAIClientPolicy::default();

        let resource = policy
            .create_resource(&LlmConfig::default(), &env)
            .await
            .unwrap();
        assert_eq!(resource.label(), "openai");
        assert_eq!(policy.resource(), Some(&resource));
        let client = resource.get::<OpenAIClient>().unwrap();
        assert_eq!(
            client.chat_url().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        policy.release_resource().await;
        assert!(!resource.is_open());
        assert!(policy.resource().is_none());

        // Idempotent.
        policy.release_resource().await;

        let err = policy
            .create_resource(&LlmConfig::default(), &env)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_release_without_create() {
        let mut policy = AzureOpenAIClientPolicy::default();
        policy.release_resource().await;
        assert!(policy.resource().is_none());
    }

    #[tokio::test]
    async fn test_auth_error() {
        let mut policy = OpenAIClientPolicy::default();
        let err = policy
            .create_resource(&LlmConfig::default(), &Env::empty())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderAuth);
        assert!(policy.resource().is_none());
    }

    #[tokio::test]
    async fn test_bad_proxy_is_unavailable() {
        let env = Env::from_pairs([
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_PROXY", "http://[::1"),
        ]);
        let mut policy = OpenAIClientPolicy::default();
        let err = policy
            .create_resource(&LlmConfig::default(), &env)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    }
}
