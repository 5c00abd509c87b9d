use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{LiveResource, ModelRequest};

/// The sampling and token settings a model object was constructed with.
///
/// Every provider maps the configuration into this common view through its
/// own field table, so that callers can inspect what a model object will
/// actually send without knowing the provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ModelSettings {
    /// The name of the model.
    pub model_name: String,
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
    /// Stop sequences.
    pub stop: Option<Vec<String>>,
    /// The maximum number of output tokens.
    pub max_tokens: Option<u32>,
    /// Whether the model streams its output.
    pub streaming: bool,
    /// Whether streamed output carries token usage.
    pub stream_usage: bool,
    /// The number of completions per request.
    pub n: Option<u32>,
    /// Reasoning parameters.
    pub reasoning: Option<Value>,
    /// Reasoning effort.
    pub reasoning_effort: Option<String>,
    /// Output verbosity for reasoning models.
    pub verbosity: Option<String>,
    /// Verbose logging of the model object.
    pub verbose: bool,
}

/// A chat-completion entity bound to its live resource at construction.
///
/// Model objects are immutable after construction. They don't send
/// anything by themselves in this crate, but they know how to turn a
/// [`ModelRequest`] into the provider's request payload.
pub trait ChatModel: Debug + Send + Sync + 'static {
    /// Returns the class identifier this model was created under.
    fn class(&self) -> &str;

    /// Returns the mapped settings.
    fn settings(&self) -> &ModelSettings;

    /// Returns the live resource this model is bound to, if any.
    fn resource(&self) -> Option<&LiveResource> {
        None
    }

    /// Builds the provider request payload for `req`.
    fn request_body(&self, req: &ModelRequest) -> Value;

    /// Returns `self` as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl dyn ChatModel {
    /// Converts the model object into its concrete type.
    #[inline]
    pub fn downcast_ref<T: ChatModel>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// A shared, type-erased model object.
pub type ChatModelRef = Arc<dyn ChatModel>;
