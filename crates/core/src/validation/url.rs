use std::collections::HashSet;

use super::{AgentNetwork, NetworkValidator};

/// Checks that URL-like and path-like tools point at reachable
/// sub-networks or tool servers.
///
/// Other tool names are references to sibling agents and are not checked
/// here.
#[derive(Clone, Debug, Default)]
pub struct UrlNetworkValidator {
    reachable: HashSet<String>,
}

impl UrlNetworkValidator {
    /// Creates a validator accepting the given endpoints.
    #[inline]
    pub fn new(reachable: HashSet<String>) -> Self {
        Self { reachable }
    }

    /// Creates a validator from sub-network names and tool server URLs.
    pub fn from_sources<I, J>(subnetworks: I, tool_servers: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self::new(subnetworks.into_iter().chain(tool_servers).collect())
    }
}

fn is_url_or_path(tool: &str) -> bool {
    tool.starts_with('/')
        || tool.starts_with("http://")
        || tool.starts_with("https://")
}

impl NetworkValidator for UrlNetworkValidator {
    fn validate(&self, network: &AgentNetwork) -> Vec<String> {
        info!("validating URLs of tool servers and sub-networks");

        let mut errors = vec![];
        for (name, agent) in network.agents() {
            for tool in &agent.tools {
                if is_url_or_path(tool) && !self.reachable.contains(tool) {
                    errors.push(format!(
                        "Agent '{name}' has invalid URL or path in tools: \
                         '{tool}'"
                    ));
                }
            }
        }
        errors
    }
}
