//! An abstraction layer for the LLM client resources.
//!
//! This crate establishes an unified protocol for the factory to turn a
//! declarative, provider-agnostic configuration into a live model client,
//! and for the provider families to own and release the network resources
//! behind that client.
//!
//! Types in this crate don't define any provider behavior, instead they are
//! the constraints that the provider implementors should adhere to.
//! Provider crates depend on this crate only, the factory that dispatches
//! between them lives in its own crate.

#![deny(missing_docs)]

mod config;
mod env;
mod error;
mod model;
mod provider;
mod request;
mod resource;

pub use config::*;
pub use env::*;
pub use error::*;
pub use model::*;
pub use provider::*;
pub use request::*;
pub use resource::*;
