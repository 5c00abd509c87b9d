use std::any::Any;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Url};
use serde_json::Value;
use switchyard_model::{
    ChatModel, Error, LiveResource, LlmConfig, ModelRequest, ModelSettings,
};

use crate::BEDROCK_CLASS;
use crate::policy::BedrockClients;
use crate::proto;

/// A chat model served by the Bedrock Converse API.
#[derive(Debug)]
pub struct BedrockChatModel {
    class: String,
    settings: ModelSettings,
    resource: LiveResource,
}

impl BedrockChatModel {
    /// Maps the configuration to the model fields.
    ///
    /// Converse has no penalties, seed or `n`, those keys are left out.
    /// Streaming is always on, token usage arrives in the stream metadata.
    pub(crate) fn from_config(
        config: &LlmConfig,
        resource: Option<&LiveResource>,
    ) -> Result<Self, Error> {
        let resource = resource.cloned().ok_or_else(|| {
            Error::other("bedrock model requires a live resource")
        })?;
        let model_name = config.model_name.clone().ok_or_else(|| {
            Error::configuration("model_name unspecified for class bedrock")
        })?;

        if config.seed.is_some()
            || config.presence_penalty.is_some()
            || config.frequency_penalty.is_some()
        {
            debug!("bedrock ignores seed and penalties for {model_name}");
        }

        let settings = ModelSettings {
            model_name,
            temperature: config.temperature,
            top_p: config.top_p,
            stop: config.stop.clone(),
            max_tokens: config.max_tokens,
            streaming: true,
            stream_usage: true,
            reasoning: config.reasoning.clone(),
            verbose: config.verbose,
            ..Default::default()
        };
        trace!("mapped {BEDROCK_CLASS} settings: {settings:?}");

        let class = config
            .class_identifier()
            .unwrap_or_else(|| BEDROCK_CLASS.to_owned());
        Ok(Self {
            class,
            settings,
            resource,
        })
    }

    fn clients(&self) -> Result<BedrockClients, Error> {
        self.resource.get::<BedrockClients>().ok_or_else(|| {
            Error::provider_unavailable(format!(
                "resource {} has been released",
                self.resource.id()
            ))
        })
    }

    fn model_url(&self, base: &Url, segments: &[&str]) -> Result<Url, Error> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::configuration(format!("{base} cannot be a base URL"))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Builds (but doesn't send) the ConverseStream request for `req`.
    pub fn request(&self, req: &ModelRequest) -> Result<RequestBuilder, Error> {
        let clients = self.clients()?;
        let url = self.model_url(
            clients.runtime_url(),
            &["model", &self.settings.model_name, "converse-stream"],
        )?;
        Ok(clients
            .runtime()
            .post(url)
            .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .header(ACCEPT, "application/vnd.amazon.eventstream")
            .json(&proto::create_request(req, &self.settings)))
    }

    /// Builds (but doesn't send) the control-plane request describing the
    /// model.
    pub fn model_info_request(&self) -> Result<RequestBuilder, Error> {
        let clients = self.clients()?;
        let url = self.model_url(
            clients.control_url(),
            &["foundation-models", &self.settings.model_name],
        )?;
        Ok(clients.control().get(url))
    }
}

impl ChatModel for BedrockChatModel {
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
        serde_json::to_value(proto::create_request(req, &self.settings))
            .unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
