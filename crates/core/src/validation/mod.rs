//! Agent network validators.
//!
//! Validators never fail: every problem they find is reported as a
//! human-readable string, so that one bad agent doesn't stop the rest of
//! the network from being checked. An empty list means the network
//! passed.

mod keyword;
mod network;
mod toolbox;
mod url;

pub use keyword::KeywordNetworkValidator;
pub use network::{AgentDefinition, AgentNetwork};
pub use toolbox::{Toolbox, ToolboxNetworkValidator};
pub use url::UrlNetworkValidator;

/// A check over an agent network.
pub trait NetworkValidator: Send + Sync {
    /// Returns the problems found in `network`, in definition order.
    fn validate(&self, network: &AgentNetwork) -> Vec<String>;
}

/// Runs several validators in order and concatenates their findings.
#[derive(Default)]
pub struct CompositeNetworkValidator {
    validators: Vec<Box<dyn NetworkValidator>>,
}

impl CompositeNetworkValidator {
    /// Creates an empty composite.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validator.
    #[inline]
    pub fn with_validator<V: NetworkValidator + 'static>(
        mut self,
        validator: V,
    ) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl NetworkValidator for CompositeNetworkValidator {
    fn validate(&self, network: &AgentNetwork) -> Vec<String> {
        self.validators
            .iter()
            .flat_map(|validator| validator.validate(network))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_composite_keeps_order() {
        let network = AgentNetwork::from_value(json!({
            "A": { "instructions": "", "tools": ["/missing"] },
            "B": { "instructions": "ok", "tools": ["http://nowhere"] },
        }))
        .unwrap();

        let validator = CompositeNetworkValidator::new()
            .with_validator(KeywordNetworkValidator)
            .with_validator(UrlNetworkValidator::new(HashSet::new()));
        assert_eq!(
            validator.validate(&network),
            vec![
                "A 'instructions' cannot be empty.",
                "Agent 'A' has invalid URL or path in tools: '/missing'",
                "Agent 'B' has invalid URL or path in tools: 'http://nowhere'",
            ]
        );
    }

    #[test]
    fn test_empty_composite_passes() {
        let network = AgentNetwork::from_value(json!({
            "A": { "instructions": "" },
        }))
        .unwrap();
        assert!(CompositeNetworkValidator::new().validate(&network).is_empty());
    }
}
