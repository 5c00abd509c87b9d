//! A model provider for AWS Bedrock.
//!
//! Bedrock needs two cooperating clients: the runtime client that serves
//! the conversations, and the control-plane client that answers questions
//! about the models. Both are opened together by [`BedrockClientPolicy`]
//! and closed together when it releases them.

#[macro_use]
extern crate tracing;

mod chat;
mod policy;
mod proto;

use std::sync::Arc;

use switchyard_model::{
    ChatModelRef, Env, Error, LiveResource, LlmConfig, LlmProvider,
};

pub use chat::BedrockChatModel;
pub use policy::{BedrockClientPolicy, BedrockClients};

/// The class identifier of [`BedrockProvider`].
pub const BEDROCK_CLASS: &str = "bedrock";

/// Models hosted on AWS Bedrock.
#[derive(Clone, Copy, Debug, Default)]
pub struct BedrockProvider;

impl LlmProvider for BedrockProvider {
    type Policy = BedrockClientPolicy;

    #[inline]
    fn create_policy(&self) -> Option<Self::Policy> {
        Some(BedrockClientPolicy::default())
    }

    fn create_model(
        &self,
        config: &LlmConfig,
        resource: Option<&LiveResource>,
        _env: &Env,
    ) -> Result<ChatModelRef, Error> {
        Ok(Arc::new(BedrockChatModel::from_config(config, resource)?))
    }
}
