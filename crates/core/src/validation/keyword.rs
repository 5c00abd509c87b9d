use super::{AgentNetwork, NetworkValidator};

/// Checks that agents with instructions don't have empty ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordNetworkValidator;

impl NetworkValidator for KeywordNetworkValidator {
    fn validate(&self, network: &AgentNetwork) -> Vec<String> {
        info!("validating agent network keywords");

        let errors: Vec<String> = network
            .agents()
            .filter(|(_, agent)| agent.instructions.as_deref() == Some(""))
            .map(|(name, _)| format!("{name} 'instructions' cannot be empty."))
            .collect();

        if !errors.is_empty() {
            warn!("{errors:?}");
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_instructions() {
        let network = AgentNetwork::from_value(json!({
            "A": { "instructions": "" },
            "B": { "instructions": "ok" },
        }))
        .unwrap();
        assert_eq!(
            KeywordNetworkValidator.validate(&network),
            vec!["A 'instructions' cannot be empty."]
        );
    }

    #[test]
    fn test_toolbox_agents_are_exempt() {
        let network = AgentNetwork::from_value(json!({
            "A": {},
            "B": { "instructions": null },
        }))
        .unwrap();
        assert!(KeywordNetworkValidator.validate(&network).is_empty());
    }
}
