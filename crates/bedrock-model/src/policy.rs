use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use switchyard_model::{
    ClientPolicy, Env, Error, LiveResource, LlmConfig, ResourceSlot,
};

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// The live resource of the Bedrock provider.
///
/// The runtime client serves conversations, the control-plane client
/// serves model metadata. They share the credentials and the region.
#[derive(Clone, Debug)]
pub struct BedrockClients {
    runtime: Client,
    control: Client,
    region: String,
    runtime_url: Url,
    control_url: Url,
}

impl BedrockClients {
    /// Returns the runtime client.
    #[inline]
    pub fn runtime(&self) -> &Client {
        &self.runtime
    }

    /// Returns the control-plane client.
    #[inline]
    pub fn control(&self) -> &Client {
        &self.control
    }

    /// Returns the AWS region.
    #[inline]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns the runtime endpoint.
    #[inline]
    pub fn runtime_url(&self) -> &Url {
        &self.runtime_url
    }

    /// Returns the control-plane endpoint.
    #[inline]
    pub fn control_url(&self) -> &Url {
        &self.control_url
    }
}

/// Client policy for the `bedrock` class.
#[derive(Debug, Default)]
pub struct BedrockClientPolicy {
    slot: ResourceSlot,
}

impl BedrockClientPolicy {
    const NAME: &str = "BedrockClientPolicy";
}

impl ClientPolicy for BedrockClientPolicy {
    async fn create_resource(
        &mut self,
        config: &LlmConfig,
        env: &Env,
    ) -> Result<LiveResource, Error> {
        self.slot.ensure_empty(Self::NAME)?;

        let region = env
            .value_or_env(config.region_name.as_deref(), None, None)
            .or_else(|| env.first_var(&["AWS_REGION", "AWS_DEFAULT_REGION"]))
            .unwrap_or_else(|| DEFAULT_REGION.to_owned());
        let token = env
            .value_or_env(
                config.aws_bearer_token.as_ref().map(|t| t.expose_secret()),
                Some("AWS_BEARER_TOKEN_BEDROCK"),
                None,
            )
            .map(SecretString::from)
            .ok_or_else(|| {
                Error::provider_auth(
                    "Bedrock token is neither configured nor set in \
                     AWS_BEARER_TOKEN_BEDROCK",
                )
            })?;
        let runtime_url = env
            .value_or_env(
                config.endpoint_url.as_deref(),
                Some("BEDROCK_ENDPOINT_URL"),
                None,
            )
            .unwrap_or_else(|| {
                format!("https://bedrock-runtime.{region}.amazonaws.com")
            });
        let control_url = format!("https://bedrock.{region}.amazonaws.com");
        let timeout = config.request_timeout()?.unwrap_or(DEFAULT_TIMEOUT);

        debug!("{} opening clients for region {region}", Self::NAME);
        let clients = BedrockClients {
            runtime: open_client(&token, timeout)?,
            control: open_client(&token, timeout)?,
            runtime_url: parse_url(&runtime_url)?,
            control_url: parse_url(&control_url)?,
            region,
        };
        self.slot
            .fill(Self::NAME, LiveResource::new("bedrock", clients))
    }

    async fn release_resource(&mut self) {
        let Some(resource) = self.slot.take() else {
            trace!("{} has nothing to release", Self::NAME);
            return;
        };
        // Neither of the clients needs an async shutdown, dropping them
        // closes their connection pools.
        match resource.close() {
            Ok(_) => {
                debug!("{} released resource {}", Self::NAME, resource.id())
            }
            Err(err) => warn!(
                "{} failed to close resource {}: {err}",
                Self::NAME,
                resource.id()
            ),
        }
    }

    fn resource(&self) -> Option<&LiveResource> {
        self.slot.get()
    }
}

fn open_client(
    token: &SecretString,
    timeout: Duration,
) -> Result<Client, Error> {
    let mut auth = HeaderValue::from_str(&format!(
        "Bearer {}",
        token.expose_secret()
    ))
    .map_err(|_| {
        Error::configuration("Bedrock token contains invalid header characters")
    })?;
    auth.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, auth);

    Client::builder()
        .default_headers(headers)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
        .map_err(|err| {
            Error::provider_unavailable(format!(
                "cannot open Bedrock client: {err}"
            ))
        })
}

#[inline]
fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|err| {
        Error::configuration(format!("invalid Bedrock endpoint {url}: {err}"))
    })
}
