use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy, Url};
use secrecy::{ExposeSecret, SecretString};
use switchyard_model::{Env, Error, LlmConfig};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// How requests authenticate against the endpoint.
#[derive(Clone)]
pub(crate) enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer(SecretString),
    /// `api-key: <key>`, used by Azure.
    ApiKey(SecretString),
}

/// Builder for [`OpenAIClientConfig`].
#[derive(Clone)]
pub struct OpenAIClientConfigBuilder {
    credential: Credential,
    chat_url: Option<String>,
    organization: Option<String>,
    proxy: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAIClientConfigBuilder {
    /// Creates a builder that authenticates with a bearer API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self::with_credential(Credential::Bearer(SecretString::from(
            api_key.into(),
        )))
    }

    /// Creates a builder that authenticates with an Azure `api-key` header.
    #[inline]
    pub fn with_azure_api_key<S: Into<String>>(api_key: S) -> Self {
        Self::with_credential(Credential::ApiKey(SecretString::from(
            api_key.into(),
        )))
    }

    #[inline]
    fn with_credential(credential: Credential) -> Self {
        Self {
            credential,
            chat_url: None,
            organization: None,
            proxy: None,
            timeout: None,
        }
    }

    /// Sets the full chat completions URL.
    #[inline]
    pub fn with_chat_url<S: Into<String>>(mut self, chat_url: S) -> Self {
        self.chat_url = Some(chat_url.into());
        self
    }

    /// Sets the organization id.
    #[inline]
    pub fn with_organization<S: Into<String>>(mut self, org: S) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Sets a proxy for all requests.
    #[inline]
    pub fn with_proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Sets the per-request timeout. Defaults to 5 minutes.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<OpenAIClientConfig, Error> {
        let chat_url = match self.chat_url {
            Some(url) => url,
            None => chat_url_from_base(DEFAULT_BASE_URL),
        };
        let chat_url = Url::parse(&chat_url).map_err(|err| {
            Error::configuration(format!("invalid endpoint {chat_url}: {err}"))
        })?;
        Ok(OpenAIClientConfig {
            credential: self.credential,
            chat_url,
            organization: self.organization,
            proxy: self.proxy,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

impl Debug for OpenAIClientConfigBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIClientConfigBuilder")
            .field("credential", &"<redacted>")
            .field("chat_url", &self.chat_url)
            .field("organization", &self.organization)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Resolved settings for opening an OpenAI-compatible HTTP client.
#[derive(Clone)]
pub struct OpenAIClientConfig {
    pub(crate) credential: Credential,
    pub(crate) chat_url: Url,
    pub(crate) organization: Option<String>,
    pub(crate) proxy: Option<String>,
    pub(crate) timeout: Duration,
}

impl OpenAIClientConfig {
    /// Resolves the OpenAI settings with the config, then `env`, then
    /// library default precedence.
    pub fn resolve_openai(
        config: &LlmConfig,
        env: &Env,
    ) -> Result<Self, Error> {
        let api_key = env
            .value_or_env(config.openai_api_key(), Some("OPENAI_API_KEY"), None)
            .ok_or_else(|| {
                Error::provider_auth(
                    "OpenAI API key is neither configured nor set in \
                     OPENAI_API_KEY",
                )
            })?;

        let mut builder = OpenAIClientConfigBuilder::with_api_key(api_key);
        if let Some(base) = env.value_or_env(
            config.openai_api_base.as_deref(),
            Some("OPENAI_API_BASE"),
            None,
        ) {
            builder = builder.with_chat_url(chat_url_from_base(&base));
        }
        if let Some(org) = env.value_or_env(
            config.openai_organization.as_deref(),
            Some("OPENAI_ORG_ID"),
            None,
        ) {
            builder = builder.with_organization(org);
        }
        if let Some(proxy) = env.value_or_env(
            config.openai_proxy.as_deref(),
            Some("OPENAI_PROXY"),
            None,
        ) {
            builder = builder.with_proxy(proxy);
        }
        if let Some(timeout) = config.request_timeout()? {
            builder = builder.with_timeout(timeout);
        }
        builder.build()
    }

    /// Resolves the Azure OpenAI settings with the config, then `env`, then
    /// library default precedence.
    ///
    /// The deployment defaults to the model name.
    pub fn resolve_azure(
        config: &LlmConfig,
        env: &Env,
    ) -> Result<Self, Error> {
        let endpoint = env
            .value_or_env(
                config.azure_endpoint.as_deref(),
                Some("AZURE_OPENAI_ENDPOINT"),
                None,
            )
            .ok_or_else(|| {
                Error::configuration(
                    "Azure endpoint is neither configured nor set in \
                     AZURE_OPENAI_ENDPOINT",
                )
            })?;
        let deployment = config
            .deployment_name
            .as_deref()
            .or(config.model_name.as_deref())
            .ok_or_else(|| {
                Error::configuration("Azure deployment_name unspecified")
            })?;
        let api_version = env
            .value_or_env(
                config.openai_api_version.as_deref(),
                Some("OPENAI_API_VERSION"),
                None,
            )
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_owned());

        let mut builder = if let Some(api_key) = env.value_or_env(
            config.openai_api_key(),
            Some("AZURE_OPENAI_API_KEY"),
            None,
        ) {
            OpenAIClientConfigBuilder::with_azure_api_key(api_key)
        } else if let Some(token) = env.value_or_env(
            config.azure_ad_token.as_ref().map(|t| t.expose_secret()),
            Some("AZURE_OPENAI_AD_TOKEN"),
            None,
        ) {
            OpenAIClientConfigBuilder::with_credential(Credential::Bearer(
                SecretString::from(token),
            ))
        } else {
            return Err(Error::provider_auth(
                "Azure OpenAI needs an api key or an AD token",
            ));
        };

        let chat_url = azure_chat_url(&endpoint, deployment, &api_version)?;
        builder = builder.with_chat_url(chat_url);
        if let Some(proxy) = env.value_or_env(
            config.openai_proxy.as_deref(),
            Some("OPENAI_PROXY"),
            None,
        ) {
            builder = builder.with_proxy(proxy);
        }
        if let Some(timeout) = config.request_timeout()? {
            builder = builder.with_timeout(timeout);
        }
        builder.build()
    }

    /// Returns the chat completions URL.
    #[inline]
    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    /// Returns the total deadline of each request.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Opens the HTTP client with the credentials baked into its default
    /// headers.
    pub(crate) fn open(&self) -> Result<Client, Error> {
        let mut headers = HeaderMap::new();
        let (name, value) = match &self.credential {
            Credential::Bearer(token) => (
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            Credential::ApiKey(key) => (
                HeaderName::from_static("api-key"),
                key.expose_secret().to_owned(),
            ),
        };
        headers.insert(name, sensitive_header(&value)?);
        if let Some(org) = &self.organization {
            headers.insert(
                HeaderName::from_static("openai-organization"),
                sensitive_header(org)?,
            );
        }

        let mut builder = Client::builder()
            .default_headers(headers)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(self.timeout);
        if let Some(proxy) = &self.proxy {
            let proxy = Proxy::all(proxy.as_str()).map_err(|err| {
                Error::provider_unavailable(format!("invalid proxy: {err}"))
            })?;
            builder = builder.proxy(proxy);
        }
        builder.build().map_err(|err| {
            Error::provider_unavailable(format!(
                "cannot open HTTP client: {err}"
            ))
        })
    }
}

impl Debug for OpenAIClientConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIClientConfig")
            .field("credential", &"<redacted>")
            .field("chat_url", &self.chat_url.as_str())
            .field("organization", &self.organization)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[inline]
fn chat_url_from_base(base: &str) -> String {
    format!("{}/chat/completions", base.trim_end_matches('/'))
}

fn azure_chat_url(
    endpoint: &str,
    deployment: &str,
    api_version: &str,
) -> Result<String, Error> {
    let mut url = Url::parse(endpoint).map_err(|err| {
        Error::configuration(format!("invalid endpoint {endpoint}: {err}"))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            Error::configuration(format!("{endpoint} cannot be a base URL"))
        })?
        .pop_if_empty()
        .extend(["openai", "deployments", deployment, "chat", "completions"]);
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url.into())
}

fn sensitive_header(value: &str) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(value).map_err(|_| {
        Error::configuration("credential contains invalid header characters")
    })?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchyard_model::ErrorKind;

    use super::*;

    #[test]
    fn test_resolve_openai_defaults() {
        let env = Env::from_pairs([("OPENAI_API_KEY", "sk-env")]);
        let config =
            OpenAIClientConfig::resolve_openai(&LlmConfig::default(), &env)
                .unwrap();
        assert_eq!(
            config.chat_url().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert!(config.organization.is_none());
        assert!(!format!("{config:?}").contains("sk-env"));
    }

    #[test]
    fn test_resolve_openai_prefers_config() {
        let env = Env::from_pairs([
            ("OPENAI_API_BASE", "https://env.example.com/v1"),
            ("OPENAI_ORG_ID", "org-env"),
        ]);
        let llm_config = LlmConfig::from_value(json!({
            "openai_api_key": "sk-config",
            "openai_api_base": "https://config.example.com/v1/",
        }))
        .unwrap();
        let config =
            OpenAIClientConfig::resolve_openai(&llm_config, &env).unwrap();
        assert_eq!(
            config.chat_url().as_str(),
            "https://config.example.com/v1/chat/completions"
        );
        assert_eq!(config.organization.as_deref(), Some("org-env"));
    }

    #[test]
    fn test_resolve_openai_without_key() {
        let err = OpenAIClientConfig::resolve_openai(
            &LlmConfig::default(),
            &Env::empty(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderAuth);
    }

    #[test]
    fn test_resolve_azure() {
        let env = Env::from_pairs([
            ("AZURE_OPENAI_ENDPOINT", "https://unit.openai.azure.com/"),
            ("AZURE_OPENAI_API_KEY", "az-key"),
        ]);
        let llm_config = LlmConfig::default().with_model_name("gpt-4o");
        let config =
            OpenAIClientConfig::resolve_azure(&llm_config, &env).unwrap();
        assert_eq!(
            config.chat_url().as_str(),
            "https://unit.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-10-21"
        );
        assert!(matches!(config.credential, Credential::ApiKey(_)));
    }

    #[test]
    fn test_azure_deployment_is_escaped() {
        let env = Env::from_pairs([
            ("AZURE_OPENAI_ENDPOINT", "https://unit.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "az-key"),
        ]);
        let llm_config = LlmConfig::default().with_model_name("a/b?c=d#e");
        let config =
            OpenAIClientConfig::resolve_azure(&llm_config, &env).unwrap();
        let url = config.chat_url();
        assert_eq!(
            url.path(),
            "/openai/deployments/a%2Fb%3Fc=d%23e/chat/completions"
        );
        assert_eq!(url.query(), Some("api-version=2024-10-21"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_default_request_timeout() {
        let env = Env::from_pairs([("OPENAI_API_KEY", "sk-env")]);
        let config =
            OpenAIClientConfig::resolve_openai(&LlmConfig::default(), &env)
                .unwrap();
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);

        let llm_config = LlmConfig::from_value(json!({
            "openai_api_key": "sk",
            "request_timeout": 12,
        }))
        .unwrap();
        let config =
            OpenAIClientConfig::resolve_openai(&llm_config, &Env::empty())
                .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(12));
    }

    #[test]
    fn test_resolve_azure_failures() {
        let env = Env::from_pairs([(
            "AZURE_OPENAI_ENDPOINT",
            "https://unit.openai.azure.com",
        )]);
        let llm_config = LlmConfig::default().with_model_name("gpt-4o");
        let err =
            OpenAIClientConfig::resolve_azure(&llm_config, &env).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderAuth);

        let err = OpenAIClientConfig::resolve_azure(&llm_config, &Env::empty())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_invalid_base_url() {
        let llm_config = LlmConfig::from_value(json!({
            "openai_api_key": "sk",
            "openai_api_base": "not a url",
        }))
        .unwrap();
        let err = OpenAIClientConfig::resolve_openai(&llm_config, &Env::empty())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
