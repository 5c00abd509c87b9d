//! Model providers for OpenAI and Azure OpenAI.
//!
//! Both families use a single async HTTP client as their live resource.
//! The client carries the credentials in its default headers, so the model
//! objects never see them.

#[macro_use]
extern crate tracing;

mod chat;
mod config;
mod policy;
mod proto;

use std::sync::Arc;

use switchyard_model::{
    ChatModelRef, Env, Error, LiveResource, LlmConfig, LlmProvider,
};

pub use chat::OpenAIChatModel;
pub use config::{OpenAIClientConfig, OpenAIClientConfigBuilder};
pub use policy::{AzureOpenAIClientPolicy, OpenAIClient, OpenAIClientPolicy};

/// The class identifier of [`OpenAIProvider`].
pub const OPENAI_CLASS: &str = "openai";

/// The class identifier of [`AzureOpenAIProvider`].
pub const AZURE_OPENAI_CLASS: &str = "azure-openai";

/// The hosted OpenAI API.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenAIProvider;

impl LlmProvider for OpenAIProvider {
    type Policy = OpenAIClientPolicy;

    #[inline]
    fn create_policy(&self) -> Option<Self::Policy> {
        Some(OpenAIClientPolicy::default())
    }

    fn create_model(
        &self,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        _env: &Env,
    ) -> Result<ChatModelRef, Error> {
        let model =
            OpenAIChatModel::from_config(OPENAI_CLASS, config, resource)?;
        Ok(Arc::new(model))
    }
}

/// OpenAI models deployed on Azure.
#[derive(Clone, Copy, Debug, Default)]
pub struct AzureOpenAIProvider;

impl LlmProvider for AzureOpenAIProvider {
    type Policy = AzureOpenAIClientPolicy;

    #[inline]
    fn create_policy(&self) -> Option<Self::Policy> {
        Some(AzureOpenAIClientPolicy::default())
    }

    fn create_model(
        &self,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        _env: &Env,
    ) -> Result<ChatModelRef, Error> {
        let model =
            OpenAIChatModel::from_config(AZURE_OPENAI_CLASS, config, resource)?;
        Ok(Arc::new(model))
    }
}
