//! The LLM resource factory: turns a configuration into a model object
//! and the policy owning its live resource, and tears them down.
//!
//! Also hosts the token budget calculator and the agent network
//! validators.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod budget;
mod factory;
mod policy;
mod resources;
pub mod validation;

pub use budget::{ModelCapacities, max_prompt_tokens};
pub use factory::{DEFAULT_RESOURCE_TIMEOUT, LlmFactory, LlmFactoryBuilder};
pub use policy::ResourcePolicy;
pub use resources::LlmResources;
