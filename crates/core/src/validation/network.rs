use serde_json::Value;
use switchyard_model::Error;

/// One agent of a network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentDefinition {
    /// The agent's instructions. Agents without instructions are toolbox
    /// agents.
    pub instructions: Option<String>,
    /// Tools the agent may call: sibling agent names, sub-network paths or
    /// tool server URLs.
    pub tools: Vec<String>,
}

/// An already-loaded agent network: agent names mapped to definitions, in
/// definition order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentNetwork {
    agents: Vec<(String, AgentDefinition)>,
}

impl AgentNetwork {
    /// Parses a network from a JSON object.
    ///
    /// Keys other than `instructions` and `tools` are ignored. A `null`
    /// field counts as missing.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let Value::Object(map) = value else {
            return Err(Error::configuration(
                "agent network must be a mapping of agent names",
            ));
        };
        let agents = map
            .into_iter()
            .map(|(name, agent)| {
                let agent = parse_agent(&name, agent)?;
                Ok((name, agent))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self { agents })
    }

    /// Appends an agent.
    #[inline]
    pub fn with_agent<S: Into<String>>(
        mut self,
        name: S,
        agent: AgentDefinition,
    ) -> Self {
        self.agents.push((name.into(), agent));
        self
    }

    /// Iterates over the agents in definition order.
    #[inline]
    pub fn agents(&self) -> impl Iterator<Item = (&str, &AgentDefinition)> {
        self.agents.iter().map(|(name, agent)| (name.as_str(), agent))
    }

    /// Returns the number of agents.
    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns `true` if the network has no agents.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn parse_agent(name: &str, value: Value) -> Result<AgentDefinition, Error> {
    let Value::Object(mut map) = value else {
        return Err(Error::configuration(format!(
            "agent `{name}` must be a mapping"
        )));
    };

    let instructions = match map.remove("instructions") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            return Err(Error::configuration(format!(
                "`instructions` of agent `{name}` must be a string"
            )));
        }
    };

    let tools = match map.remove("tools") {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(tools)) => tools
            .into_iter()
            .map(|tool| match tool {
                Value::String(s) => Ok(s),
                _ => Err(Error::configuration(format!(
                    "`tools` of agent `{name}` must be strings"
                ))),
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(Error::configuration(format!(
                "`tools` of agent `{name}` must be a list"
            )));
        }
    };

    Ok(AgentDefinition {
        instructions,
        tools,
    })
}
