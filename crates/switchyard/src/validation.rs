use std::collections::HashSet;

use switchyard_core::validation::{
    CompositeNetworkValidator, KeywordNetworkValidator, Toolbox,
    ToolboxNetworkValidator, UrlNetworkValidator,
};

/// Returns the validator run over agent networks before they are served.
///
/// It checks, in order, toolbox agents against `toolbox`, URL-like tools
/// against `reachable`, and instructions keywords.
pub fn default_network_validator<T: Toolbox + 'static>(
    reachable: HashSet<String>,
    toolbox: T,
) -> CompositeNetworkValidator {
    CompositeNetworkValidator::new()
        .with_validator(ToolboxNetworkValidator::new(toolbox))
        .with_validator(UrlNetworkValidator::new(reachable))
        .with_validator(KeywordNetworkValidator)
}
