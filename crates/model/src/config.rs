use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::Error;

/// A fully-resolved configuration for one model instantiation request.
///
/// Every field is optional at parse time. Which ones are required depends
/// on the provider family selected by `class`, and is checked when the
/// resources are created. Unknown keys are ignored.
///
/// Credentials are held as [`SecretString`], they never show up in the
/// `Debug` output.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// The class identifier selecting the provider family.
    pub class: Option<String>,
    /// The name of the model.
    #[serde(alias = "model")]
    pub model_name: Option<String>,
    /// The sampling temperature.
    pub temperature: Option<f64>,
    /// The nucleus-sampling probability mass.
    pub top_p: Option<f64>,
    /// The presence penalty.
    pub presence_penalty: Option<f64>,
    /// The frequency penalty.
    pub frequency_penalty: Option<f64>,
    /// A seed for deterministic sampling.
    pub seed: Option<i64>,
    /// Stop sequences. A single string is accepted as a one-item list.
    #[serde(deserialize_with = "deserialize_stop")]
    pub stop: Option<Vec<String>>,
    /// The streaming flag. Some providers force it on.
    pub streaming: Option<bool>,
    /// The maximum number of output tokens.
    pub max_tokens: Option<u32>,
    /// The fraction of the model capacity to use for prompts.
    pub prompt_token_fraction: Option<f64>,
    /// Overrides the documented total token capacity of the model.
    pub context_window: Option<u64>,
    /// Reasoning parameters, passed through as-is.
    pub reasoning: Option<Value>,
    /// Reasoning effort for reasoning models.
    pub reasoning_effort: Option<String>,
    /// Output verbosity for reasoning models.
    pub verbosity: Option<String>,
    /// Whether to return log probabilities.
    pub logprobs: Option<bool>,
    /// The number of most likely tokens to return at each position.
    pub top_logprobs: Option<u32>,
    /// Token id to bias mapping.
    pub logit_bias: Option<BTreeMap<String, i64>>,
    /// Per-request timeout in seconds.
    pub request_timeout: Option<f64>,
    /// Maximum retries the model object may perform.
    pub max_retries: Option<u32>,
    /// Verbose logging of the model object. Never read from a global.
    pub verbose: bool,

    /// OpenAI API key.
    #[serde(deserialize_with = "deserialize_secret")]
    pub openai_api_key: Option<SecretString>,
    /// OpenAI API base URL.
    pub openai_api_base: Option<String>,
    /// OpenAI organization id.
    pub openai_organization: Option<String>,
    /// Proxy for OpenAI requests.
    pub openai_proxy: Option<String>,

    /// Azure OpenAI endpoint.
    pub azure_endpoint: Option<String>,
    /// Azure OpenAI deployment name.
    pub deployment_name: Option<String>,
    /// Azure OpenAI API version.
    pub openai_api_version: Option<String>,
    /// Azure Active Directory token.
    #[serde(deserialize_with = "deserialize_secret")]
    pub azure_ad_token: Option<SecretString>,

    /// AWS region for Bedrock.
    pub region_name: Option<String>,
    /// Bedrock API key (bearer token).
    #[serde(deserialize_with = "deserialize_secret")]
    pub aws_bearer_token: Option<SecretString>,
    /// Custom Bedrock runtime endpoint.
    pub endpoint_url: Option<String>,

    /// Ollama server URL.
    pub base_url: Option<String>,
    /// Ollama context size.
    pub num_ctx: Option<u32>,
    /// How long Ollama keeps the model loaded.
    pub keep_alive: Option<String>,
}

impl LlmConfig {
    /// Parses a configuration from a JSON value.
    ///
    /// Unknown keys are ignored. A known key with a value of the wrong
    /// shape is a configuration error.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        if !value.is_object() {
            return Err(Error::configuration("llm config must be a mapping"));
        }
        serde_json::from_value(value)
            .map_err(|err| Error::configuration(format!("{err}")))
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(s)
            .map_err(|err| Error::configuration(format!("{err}")))?;
        Self::from_value(value)
    }

    /// Returns the normalized class identifier, if any.
    ///
    /// The identifier is trimmed and lower-cased, an empty identifier is
    /// treated as missing.
    pub fn class_identifier(&self) -> Option<String> {
        self.class
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
    }

    /// Returns the model name, or `"<unspecified>"` for messages.
    #[inline]
    pub fn model_name_or_placeholder(&self) -> &str {
        self.model_name.as_deref().unwrap_or("<unspecified>")
    }

    /// Returns the request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Result<Option<Duration>, Error> {
        let Some(secs) = self.request_timeout else {
            return Ok(None);
        };
        Duration::try_from_secs_f64(secs).map(Some).map_err(|_| {
            Error::configuration(format!("invalid request_timeout: {secs}"))
        })
    }

    /// Returns the exposed OpenAI API key, if any.
    #[inline]
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key.as_ref().map(|k| k.expose_secret())
    }

    /// Sets the class identifier.
    #[inline]
    pub fn with_class<S: Into<String>>(mut self, class: S) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Sets the model name.
    #[inline]
    pub fn with_model_name<S: Into<String>>(mut self, model_name: S) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum number of output tokens.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the prompt token fraction.
    #[inline]
    pub fn with_prompt_token_fraction(mut self, fraction: f64) -> Self {
        self.prompt_token_fraction = Some(fraction);
        self
    }

    /// Sets the OpenAI API key.
    #[inline]
    pub fn with_openai_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.openai_api_key = Some(SecretString::from(api_key.into()));
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StopSequences {
    One(String),
    Many(Vec<String>),
}

fn deserialize_stop<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StopSequences>::deserialize(deserializer)?.map(|stop| {
        match stop {
            StopSequences::One(s) => vec![s],
            StopSequences::Many(v) => v,
        }
    }))
}

fn deserialize_secret<'de, D>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_parse_known_and_unknown_keys() {
        let config = LlmConfig::from_value(json!({
            "class": "  OpenAI ",
            "model": "gpt-4o",
            "temperature": 0.2,
            "stop": "END",
            "openai_api_key": "sk-secret",
            "reasoning": { "effort": "low" },
            "some_future_key": [1, 2, 3],
        }))
        .unwrap();

        assert_eq!(config.class_identifier().as_deref(), Some("openai"));
        assert_eq!(config.model_name.as_deref(), Some("gpt-4o"));
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.stop, Some(vec!["END".to_owned()]));
        assert_eq!(config.reasoning, Some(json!({ "effort": "low" })));
        assert_eq!(config.openai_api_key(), Some("sk-secret"));
        assert!(!config.verbose);

        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_secret_fields() {
        let config = LlmConfig::from_value(json!({
            "openai_api_key": "",
            "azure_ad_token": "ad-token",
            "aws_bearer_token": null,
        }))
        .unwrap();
        assert!(config.openai_api_key.is_none());
        assert_eq!(
            config.azure_ad_token.as_ref().map(|t| t.expose_secret()),
            Some("ad-token")
        );
        assert!(config.aws_bearer_token.is_none());
    }

    #[test]
    fn test_stop_list() {
        let config =
            LlmConfig::from_json_str(r#"{"stop": ["a", "b"]}"#).unwrap();
        assert_eq!(config.stop, Some(vec!["a".to_owned(), "b".to_owned()]));
    }

    #[test]
    fn test_wrong_shape_is_configuration_error() {
        let err = LlmConfig::from_value(json!({ "temperature": "hot" }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = LlmConfig::from_value(json!(["openai"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_blank_class_is_missing() {
        let config = LlmConfig::default().with_class("   ");
        assert_eq!(config.class_identifier(), None);
        assert_eq!(LlmConfig::default().class_identifier(), None);
    }

    #[test]
    fn test_request_timeout() {
        let config = LlmConfig::from_value(json!({ "request_timeout": 2.5 }))
            .unwrap();
        assert_eq!(
            config.request_timeout(),
            Ok(Some(Duration::from_millis(2500)))
        );

        let config = LlmConfig::from_value(json!({ "request_timeout": -1.0 }))
            .unwrap();
        assert!(config.request_timeout().is_err());
    }
}
