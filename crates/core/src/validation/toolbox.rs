use std::collections::HashSet;

use super::{AgentNetwork, NetworkValidator};

/// A source of the tool names available to toolbox agents.
pub trait Toolbox: Send + Sync {
    /// Loads the tool names, or describes why the toolbox is unavailable.
    fn tool_names(&self) -> Result<HashSet<String>, String>;
}

impl Toolbox for HashSet<String> {
    #[inline]
    fn tool_names(&self) -> Result<HashSet<String>, String> {
        Ok(self.clone())
    }
}

/// Checks that every toolbox agent, that is an agent without
/// instructions, has a matching tool in the toolbox.
pub struct ToolboxNetworkValidator<T> {
    toolbox: T,
}

impl<T: Toolbox> ToolboxNetworkValidator<T> {
    /// Creates a validator backed by `toolbox`.
    #[inline]
    pub fn new(toolbox: T) -> Self {
        Self { toolbox }
    }
}

impl<T: Toolbox> NetworkValidator for ToolboxNetworkValidator<T> {
    fn validate(&self, network: &AgentNetwork) -> Vec<String> {
        info!("validating toolbox agents");

        let mut toolbox_agents = network
            .agents()
            .filter(|(_, agent)| agent.instructions.is_none())
            .map(|(name, _)| name)
            .peekable();
        if toolbox_agents.peek().is_none() {
            return vec![];
        }

        match self.toolbox.tool_names() {
            Ok(tools) => toolbox_agents
                .filter(|name| !tools.contains(*name))
                .map(|name| {
                    format!(
                        "Toolbox agent '{name}' has no matching tool in \
                         toolbox."
                    )
                })
                .collect(),
            Err(reason) => {
                warn!("toolbox is unavailable: {reason}");
                toolbox_agents
                    .map(|name| {
                        format!(
                            "Toolbox is unavailable. Cannot create Toolbox \
                             agent '{name}'."
                        )
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct BrokenToolbox;

    impl Toolbox for BrokenToolbox {
        fn tool_names(&self) -> Result<HashSet<String>, String> {
            Err("toolbox_info.hocon not found".to_owned())
        }
    }

    fn network() -> AgentNetwork {
        AgentNetwork::from_value(json!({
            "front": { "instructions": "route", "tools": ["search", "calc"] },
            "search": {},
            "calc": { "instructions": null },
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_tool() {
        let toolbox = HashSet::from(["search".to_owned()]);
        assert_eq!(
            ToolboxNetworkValidator::new(toolbox).validate(&network()),
            vec!["Toolbox agent 'calc' has no matching tool in toolbox."]
        );
    }

    #[test]
    fn test_unavailable_toolbox() {
        assert_eq!(
            ToolboxNetworkValidator::new(BrokenToolbox).validate(&network()),
            vec![
                "Toolbox is unavailable. Cannot create Toolbox agent 'search'.",
                "Toolbox is unavailable. Cannot create Toolbox agent 'calc'.",
            ]
        );
    }
}
