use std::any::Any;

use reqwest::RequestBuilder;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use switchyard_model::{
    ChatModel, Error, LiveResource, LlmConfig, ModelRequest, ModelSettings,
};

use crate::policy::OpenAIClient;
use crate::proto::{self, LogprobSettings};

/// A chat model for OpenAI-compatible endpoints, bound to an
/// [`OpenAIClient`] resource.
#[derive(Debug)]
pub struct OpenAIChatModel {
    class: String,
    settings: ModelSettings,
    extras: LogprobSettings,
    max_retries: Option<u32>,
    resource: LiveResource,
}

impl OpenAIChatModel {
    /// Maps the configuration to the model fields.
    ///
    /// Streaming and usage reporting are always on, output token counting
    /// depends on them. `n` is always 1, only one completion is ever
    /// considered.
    ///
    /// The model reports the class it was requested with, `default_class`
    /// if the configuration has none.
    pub(crate) fn from_config(
        default_class: &str,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
    ) -> Result<Self, Error> {
        let class = config
            .class_identifier()
            .unwrap_or_else(|| default_class.to_owned());
        let resource = resource.cloned().ok_or_else(|| {
            Error::other(format!("{class} model requires a live resource"))
        })?;
        let model_name = config
            .model_name
            .clone()
            .or_else(|| config.deployment_name.clone())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "model_name unspecified for class {class}"
                ))
            })?;

        let settings = ModelSettings {
            model_name,
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
        if config.streaming == Some(false) {
            debug!("{class} ignores streaming=false, token counting needs it");
        }
        trace!("mapped {class} settings: {settings:?}");

        Ok(Self {
            class,
            settings,
            extras: LogprobSettings {
                logprobs: config.logprobs,
                top_logprobs: config.top_logprobs,
                logit_bias: config.logit_bias.clone(),
            },
            max_retries: config.max_retries,
            resource,
        })
    }

    /// Returns the retry budget for callers that send requests.
    #[inline]
    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Builds (but doesn't send) the chat completions request for `req`.
    ///
    /// Fails with [`ErrorKind::ProviderUnavailable`] once the resource has
    /// been released.
    ///
    /// [`ErrorKind::ProviderUnavailable`]: switchyard_model::ErrorKind
    pub fn request(&self, req: &ModelRequest) -> Result<RequestBuilder, Error> {
        let client = self.resource.get::<OpenAIClient>().ok_or_else(|| {
            Error::provider_unavailable(format!(
                "resource {} has been released",
                self.resource.id()
            ))
        })?;
        Ok(client
            .http()
            .post(client.chat_url().clone())
            .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .header(ACCEPT, mime::TEXT_EVENT_STREAM.as_ref())
            .json(&proto::create_request(req, &self.settings, &self.extras)))
    }
}

impl ChatModel for OpenAIChatModel {
    fn class(&self) -> &str {
        &self.class
    }

    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn resource(&self) -> Option<&LiveResource> {
        Some(&self.resource)
    }

    fn request_body(&self, req: &ModelRequest) -> Value {
        serde_json::to_value(proto::create_request(
            req,
            &self.settings,
            &self.extras,
        ))
        .unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
