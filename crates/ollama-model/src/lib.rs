//! A model provider for a local Ollama server.
//!
//! Ollama needs no managed live resource: the provider has no client
//! policy, and the model object borrows whatever HTTP client the caller
//! hands it.

#[macro_use]
extern crate tracing;

mod proto;

use std::any::Any;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use switchyard_model::{
    ChatModel, ChatModelRef, Env, Error, LiveResource, LlmConfig,
    LlmProvider, ModelRequest, ModelSettings, NoClientPolicy,
};

/// The class identifier of [`OllamaProvider`].
pub const OLLAMA_CLASS: &str = "ollama";

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Models served by Ollama.
#[derive(Clone, Copy, Debug, Default)]
pub struct OllamaProvider;

impl LlmProvider for OllamaProvider {
    type Policy = NoClientPolicy;

    #[inline]
    fn create_policy(&self) -> Option<Self::Policy> {
        None
    }

    fn create_model(
        &self,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        env: &Env,
    ) -> Result<ChatModelRef, Error> {
        Ok(Arc::new(OllamaChatModel::from_config(config, resource, env)?))
    }
}

/// A chat model served by the Ollama chat API.
#[derive(Debug)]
pub struct OllamaChatModel {
    class: String,
    settings: ModelSettings,
    chat_url: Url,
    options: proto::Options,
    keep_alive: Option<String>,
}

impl OllamaChatModel {
    fn from_config(
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        env: &Env,
    ) -> Result<Self, Error> {
        let model_name = config.model_name.clone().ok_or_else(|| {
            Error::configuration("model_name unspecified for class ollama")
        })?;

        let base_url = env
            .value_or_env(
                config.base_url.as_deref(),
                Some("OLLAMA_HOST"),
                resource,
            )
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        // `OLLAMA_HOST` is often just `host:port`.
        let base_url = if base_url.contains("://") {
            base_url
        } else {
            format!("http://{base_url}")
        };
        let chat_url = format!("{}/api/chat", base_url.trim_end_matches('/'));
        let chat_url = Url::parse(&chat_url).map_err(|err| {
            Error::configuration(format!(
                "invalid Ollama URL {chat_url}: {err}"
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
            streaming: config.streaming.unwrap_or(true),
            reasoning: config.reasoning.clone(),
            verbose: config.verbose,
            ..Default::default()
        };
        trace!("mapped {OLLAMA_CLASS} settings: {settings:?}");

        Ok(Self {
            class: config
                .class_identifier()
                .unwrap_or_else(|| OLLAMA_CLASS.to_owned()),
            options: proto::Options::from_settings(&settings, config.num_ctx),
            settings,
            chat_url,
            keep_alive: config.keep_alive.clone(),
        })
    }

    /// Returns the chat endpoint.
    #[inline]
    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    /// Builds (but doesn't send) the chat request for `req` on a client
    /// owned by the caller.
    pub fn request(
        &self,
        client: &Client,
        req: &ModelRequest,
    ) -> RequestBuilder {
        client
            .post(self.chat_url.clone())
            .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .json(&self.create_request(req))
    }

    #[inline]
    fn create_request(&self, req: &ModelRequest) -> proto::ChatRequest {
        proto::create_request(
            req,
            &self.settings,
            &self.options,
            self.keep_alive.as_deref(),
        )
    }
}

impl ChatModel for OllamaChatModel {
    fn class(&self) -> &str {
        &self.class
    }

    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn request_body(&self, req: &ModelRequest) -> Value {
        serde_json::to_value(self.create_request(req)).unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
