use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use switchyard_model::{ChatModelRef, Env, Error, LlmConfig, LlmProvider};
use tokio::time::timeout;
use tracing::Instrument;

use crate::LlmResources;
use crate::budget::{ModelCapacities, max_prompt_tokens};
use crate::policy::{ProviderObjectImpl, ProviderRef};
use crate::resources::PolicyGuard;

/// How long a factory call may take to create the live resource unless
/// configured otherwise.
pub const DEFAULT_RESOURCE_TIMEOUT: Duration = Duration::from_secs(30);

fn normalize_class(class: &str) -> String {
    class.trim().to_lowercase()
}

/// [`LlmFactory`] builder.
///
/// All registrations happen here, so a built factory's registry never
/// changes.
pub struct LlmFactoryBuilder {
    providers: HashMap<String, ProviderRef>,
    capacities: ModelCapacities,
    env: Env,
    timeout: Duration,
}

impl Default for LlmFactoryBuilder {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            capacities: ModelCapacities::default(),
            env: Env::system(),
            timeout: DEFAULT_RESOURCE_TIMEOUT,
        }
    }
}

impl LlmFactoryBuilder {
    /// Creates a builder with no providers.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `class`.
    ///
    /// The class identifier is normalized like the configuration's. A
    /// provider already registered under the same identifier is replaced.
    pub fn register_policy<P: LlmProvider>(
        mut self,
        class: impl AsRef<str>,
        provider: P,
    ) -> Self {
        let class = normalize_class(class.as_ref());
        let provider: ProviderRef = Arc::new(ProviderObjectImpl(provider));
        if self.providers.insert(class.clone(), provider).is_some() {
            debug!("provider for class `{class}` replaced");
        }
        self
    }

    /// Registers `provider` under `class`, failing if the identifier is
    /// already taken.
    pub fn register_policy_checked<P: LlmProvider>(
        mut self,
        class: impl AsRef<str>,
        provider: P,
    ) -> Result<Self, Error> {
        let class = normalize_class(class.as_ref());
        match self.providers.entry(class) {
            Entry::Occupied(entry) => Err(Error::configuration(format!(
                "class `{}` is already registered",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(ProviderObjectImpl(provider)));
                Ok(self)
            }
        }
    }

    /// Sets the context window of `model`, overriding the built-in table.
    #[inline]
    pub fn with_capacity(
        mut self,
        model: impl Into<String>,
        capacity: u64,
    ) -> Self {
        self.capacities.insert(model, capacity);
        self
    }

    /// Replaces the whole context window table.
    #[inline]
    pub fn with_capacities(mut self, capacities: ModelCapacities) -> Self {
        self.capacities = capacities;
        self
    }

    /// Sets the environment used for credential and endpoint fallbacks.
    #[inline]
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    /// Sets the default bound of resource creation.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the factory.
    #[inline]
    pub fn build(self) -> LlmFactory {
        LlmFactory {
            inner: Arc::new(FactoryInner {
                providers: self.providers,
                capacities: self.capacities,
                env: self.env,
                timeout: self.timeout,
            }),
        }
    }
}

impl Debug for LlmFactoryBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&String> = self.providers.keys().collect();
        classes.sort_unstable();
        f.debug_struct("LlmFactoryBuilder")
            .field("classes", &classes)
            .field("env", &self.env)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

struct FactoryInner {
    providers: HashMap<String, ProviderRef>,
    capacities: ModelCapacities,
    env: Env,
    timeout: Duration,
}

/// Turns a configuration into a model object and the policy owning its
/// live resource.
///
/// The factory keeps no state across calls besides its registry, and can
/// be cloned and shared freely. Every call produces an independently
/// owned resource.
#[derive(Clone)]
pub struct LlmFactory {
    inner: Arc<FactoryInner>,
}

impl LlmFactory {
    /// Creates a builder.
    #[inline]
    pub fn builder() -> LlmFactoryBuilder {
        LlmFactoryBuilder::new()
    }

    /// Returns the registered class identifiers in sorted order.
    pub fn registered_classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> =
            self.inner.providers.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }

    /// Returns the environment used for fallbacks.
    #[inline]
    pub fn env(&self) -> &Env {
        &self.inner.env
    }

    fn provider(
        &self,
        config: &LlmConfig,
    ) -> Result<(String, ProviderRef), Error> {
        let model_name = config.model_name_or_placeholder();
        let Some(class) = config.class_identifier() else {
            return Err(Error::configuration(format!(
                "class unspecified for model_name `{model_name}`"
            )));
        };
        let Some(provider) = self.inner.providers.get(&class) else {
            return Err(Error::configuration(format!(
                "class unrecognized: `{class}` for model_name `{model_name}`"
            )));
        };
        Ok((class, Arc::clone(provider)))
    }

    /// Creates the model object and its live resource.
    ///
    /// Resource creation is bounded by the factory's timeout.
    #[inline]
    pub async fn create_resources(
        &self,
        config: &LlmConfig,
    ) -> Result<LlmResources, Error> {
        self.create_resources_with_timeout(config, self.inner.timeout)
            .await
    }

    /// Parses `config` and creates the model object and its live resource.
    pub async fn create_resources_from_value(
        &self,
        config: Value,
    ) -> Result<LlmResources, Error> {
        let config = LlmConfig::from_value(config)?;
        self.create_resources(&config).await
    }

    /// Creates the model object and its live resource, giving up on
    /// resource creation after `limit`. Releasing a half-created resource
    /// after a failure is bounded by `limit` as well.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. A live resource created before the
    /// call is abandoned is released in the background.
    pub async fn create_resources_with_timeout(
        &self,
        config: &LlmConfig,
        limit: Duration,
    ) -> Result<LlmResources, Error> {
        let (class, provider) = self.provider(config)?;
        let env = &self.inner.env;
        let span = debug_span!(
            "create resources",
            class = %class,
            model = config.model_name_or_placeholder()
        );

        async move {
            let mut guard = PolicyGuard::new(provider.create_policy());
            let created = match guard.policy_mut() {
                Some(policy) => Some(
                    timeout(limit, policy.create_resource(config, env)).await,
                ),
                None => None,
            };
            let resource = match created {
                None => None,
                Some(Ok(Ok(resource))) => Some(resource),
                Some(Ok(Err(err))) => {
                    debug!("failed to create resource: {err}");
                    guard.release(limit).await;
                    return Err(err);
                }
                Some(Err(_)) => {
                    guard.release(limit).await;
                    return Err(Error::provider_unavailable(format!(
                        "creating the live resource for class `{class}` \
                         timed out after {limit:?}"
                    )));
                }
            };

            match provider.create_model(config, resource.as_ref(), env) {
                Ok(model) => {
                    trace!("mapped settings: {:?}", model.settings());
                    Ok(LlmResources::new(model, guard.disarm()))
                }
                Err(err) => {
                    debug!("failed to create model: {err}");
                    guard.release(limit).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Creates the model object only.
    ///
    /// The policy is dropped without releasing anything, so a live
    /// resource created by this call stays open until the model object
    /// and all its clones are gone.
    #[deprecated(
        note = "use `create_resources`, which lets the caller release the \
                live resource"
    )]
    pub async fn create_base_chat_model(
        &self,
        config: &LlmConfig,
    ) -> Result<ChatModelRef, Error> {
        let (model, policy) =
            self.create_resources(config).await?.into_parts();
        if policy.is_some_and(|policy| policy.resource().is_some()) {
            debug!(
                "live resource of model `{}` is left unmanaged",
                model.settings().model_name
            );
        }
        Ok(model)
    }

    /// Returns the maximum number of prompt tokens for the configured
    /// model.
    ///
    /// The capacity is `context_window` from the configuration if set,
    /// otherwise it is looked up in the factory's table.
    pub fn max_prompt_tokens(
        &self,
        config: &LlmConfig,
    ) -> Result<u64, Error> {
        let capacity = match config.context_window {
            Some(capacity) => capacity,
            None => {
                let Some(model_name) = config.model_name.as_deref() else {
                    return Err(Error::configuration(
                        "model_name unspecified, cannot find context window",
                    ));
                };
                self.inner.capacities.require(model_name)?
            }
        };
        max_prompt_tokens(capacity, config.prompt_token_fraction)
    }
}

impl Debug for LlmFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmFactory")
            .field("classes", &self.registered_classes())
            .field("env", &self.inner.env)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}
