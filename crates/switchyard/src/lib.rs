//! Turns declarative model configurations into live model clients, and
//! tears them down again.
//!
//! Start with [`default_factory_builder`], which knows about every
//! provider family shipped with this crate, add your own providers if
//! needed, and build an [`LlmFactory`]:
//!
//! ```no_run
//! # async fn run() -> Result<(), switchyard::model::Error> {
//! use switchyard::default_factory_builder;
//! use switchyard::model::LlmConfig;
//!
//! let factory = default_factory_builder().build();
//! let config = LlmConfig::default()
//!     .with_class("openai")
//!     .with_model_name("gpt-4o");
//! let resources = factory.create_resources(&config).await?;
//! // ... use `resources.model()` ...
//! resources.delete_resources().await;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod validation;

use switchyard_bedrock_model::{BEDROCK_CLASS, BedrockProvider};
use switchyard_ollama_model::{OLLAMA_CLASS, OllamaProvider};
use switchyard_openai_model::{
    AZURE_OPENAI_CLASS, AzureOpenAIProvider, OPENAI_CLASS, OpenAIProvider,
};

pub use switchyard_core::{LlmFactory, LlmFactoryBuilder, LlmResources};
pub use validation::default_network_validator;

/// Re-exports of [`switchyard_core`] crate.
pub mod core {
    pub use switchyard_core::*;
}

/// Re-exports of [`switchyard_model`] crate.
pub mod model {
    pub use switchyard_model::*;
}

/// Re-exports of the provider crates.
pub mod providers {
    /// Re-exports of [`switchyard_openai_model`] crate.
    pub mod openai {
        pub use switchyard_openai_model::*;
    }

    /// Re-exports of [`switchyard_bedrock_model`] crate.
    pub mod bedrock {
        pub use switchyard_bedrock_model::*;
    }

    /// Re-exports of [`switchyard_ollama_model`] crate.
    pub mod ollama {
        pub use switchyard_ollama_model::*;
    }
}

/// Returns a factory builder with the built-in providers registered.
///
/// | Class          | Provider                |
/// |----------------|-------------------------|
/// | `openai`       | [`OpenAIProvider`]      |
/// | `azure-openai` | [`AzureOpenAIProvider`] |
/// | `bedrock`      | [`BedrockProvider`]     |
/// | `ollama`       | [`OllamaProvider`]      |
///
/// Registering another provider under one of these classes replaces the
/// built-in one.
pub fn default_factory_builder() -> LlmFactoryBuilder {
    debug!("registering built-in providers");
    LlmFactoryBuilder::new()
        .register_policy(OPENAI_CLASS, OpenAIProvider)
        .register_policy(AZURE_OPENAI_CLASS, AzureOpenAIProvider)
        .register_policy(BEDROCK_CLASS, BedrockProvider)
        .register_policy(OLLAMA_CLASS, OllamaProvider)
}
