//! Prompt token budgeting.

use std::collections::HashMap;

use switchyard_model::Error;

/// The fraction of the context window used for prompts when the
/// configuration doesn't say otherwise.
pub const DEFAULT_PROMPT_TOKEN_FRACTION: f64 = 0.5;

/// Returns the maximum number of prompt tokens for a model with the given
/// total `capacity`.
///
/// The result is `floor(capacity * fraction)`, where `fraction` defaults to
/// [`DEFAULT_PROMPT_TOKEN_FRACTION`]. A fraction outside `(0, 1]` is a
/// configuration error.
pub fn max_prompt_tokens(
    capacity: u64,
    fraction: Option<f64>,
) -> Result<u64, Error> {
    let fraction = fraction.unwrap_or(DEFAULT_PROMPT_TOKEN_FRACTION);
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(Error::configuration(format!(
            "prompt_token_fraction must be in (0, 1], got {fraction}"
        )));
    }
    if fraction == 1.0 {
        return Ok(capacity);
    }
    Ok((capacity as f64 * fraction).floor() as u64)
}

const BUILTIN_CAPACITIES: &[(&str, u64)] = &[
    ("gpt-3.5-turbo", 16_385),
    ("gpt-4", 8_192),
    ("gpt-4-32k", 32_768),
    ("gpt-4-turbo", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("gpt-4.1", 1_047_576),
    ("gpt-4.1-mini", 1_047_576),
    ("gpt-4.1-nano", 1_047_576),
    ("gpt-5", 400_000),
    ("gpt-5-mini", 400_000),
    ("gpt-5-nano", 400_000),
    ("o1", 200_000),
    ("o1-mini", 128_000),
    ("o3", 200_000),
    ("o3-mini", 200_000),
    ("o4-mini", 200_000),
    ("claude-3-haiku", 200_000),
    ("claude-3-5-haiku", 200_000),
    ("claude-3-5-sonnet", 200_000),
    ("claude-3-7-sonnet", 200_000),
    ("claude-sonnet-4", 200_000),
    ("claude-opus-4", 200_000),
    ("anthropic.claude", 200_000),
    ("us.anthropic.claude", 200_000),
    ("amazon.nova-micro", 128_000),
    ("amazon.nova-lite", 300_000),
    ("amazon.nova-pro", 300_000),
    ("meta.llama3-1", 128_000),
    ("llama3", 8_192),
    ("llama3.1", 131_072),
    ("llama3.2", 131_072),
    ("qwen2.5", 32_768),
    ("mistral", 32_768),
];

/// Documented context window sizes, keyed by model name.
///
/// Lookup tries the exact name first, then the longest known name the
/// model name starts with, so that dated snapshots like
/// `gpt-4o-2024-08-06` resolve to their family.
#[derive(Clone, Debug)]
pub struct ModelCapacities {
    entries: HashMap<String, u64>,
}

impl Default for ModelCapacities {
    fn default() -> Self {
        Self {
            entries: BUILTIN_CAPACITIES
                .iter()
                .map(|(name, capacity)| ((*name).to_owned(), *capacity))
                .collect(),
        }
    }
}

impl ModelCapacities {
    /// Creates an empty table.
    #[inline]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds or replaces the capacity of `model`.
    #[inline]
    pub fn insert<S: Into<String>>(&mut self, model: S, capacity: u64) {
        self.entries.insert(model.into(), capacity);
    }

    /// Returns the capacity of `model`, if known.
    pub fn get(&self, model: &str) -> Option<u64> {
        if let Some(capacity) = self.entries.get(model) {
            return Some(*capacity);
        }
        self.entries
            .iter()
            .filter(|(name, _)| model.starts_with(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, capacity)| *capacity)
    }

    /// Returns the capacity of `model`, or a configuration error naming it.
    pub fn require(&self, model: &str) -> Result<u64, Error> {
        self.get(model).ok_or_else(|| {
            Error::configuration(format!(
                "unknown context window for model `{model}`"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use switchyard_model::ErrorKind;

    use super::*;

    #[test]
    fn test_budget() {
        assert_eq!(max_prompt_tokens(128_000, Some(0.25)).unwrap(), 32_000);
        assert_eq!(max_prompt_tokens(8_192, Some(1.0)).unwrap(), 8_192);
        assert_eq!(max_prompt_tokens(16_385, None).unwrap(), 8_192);
        assert_eq!(max_prompt_tokens(10, Some(0.33)).unwrap(), 3);
    }

    #[test]
    fn test_fraction_out_of_range() {
        for fraction in [0.0, -0.1, 1.5, f64::NAN] {
            let err = max_prompt_tokens(1_000, Some(fraction)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn test_capacity_lookup() {
        let capacities = ModelCapacities::default();
        assert_eq!(capacities.get("gpt-4"), Some(8_192));
        assert_eq!(capacities.get("gpt-4o"), Some(128_000));
        assert_eq!(capacities.get("gpt-4o-2024-08-06"), Some(128_000));
        assert_eq!(capacities.get("gpt-4.1-mini-2025-04-14"), Some(1_047_576));
        assert_eq!(capacities.get("o3-mini-high"), Some(200_000));
        assert_eq!(capacities.get("llama3.1:8b"), Some(131_072));
        assert_eq!(capacities.get("my-own-model"), None);

        let err = capacities.require("my-own-model").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().contains("my-own-model"));
    }

    #[test]
    fn test_overrides() {
        let mut capacities = ModelCapacities::empty();
        assert_eq!(capacities.get("gpt-4o"), None);
        capacities.insert("my-own-model", 4_096);
        assert_eq!(capacities.get("my-own-model-v2"), Some(4_096));
    }
}
