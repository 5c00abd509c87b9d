use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::LiveResource;

type LookupFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A source of environment-derived defaults.
///
/// Providers never read the process environment directly. The factory
/// threads an `Env` through every call, so that hosts (and tests) can
/// decide where credentials and endpoints come from.
///
/// Empty values are treated as absent.
#[derive(Clone)]
pub struct Env {
    lookup: LookupFn,
}

impl Env {
    /// Creates an `Env` that reads the process environment.
    #[inline]
    pub fn system() -> Self {
        Self::from_fn(|name| std::env::var(name).ok())
    }

    /// Creates an `Env` without any variables.
    #[inline]
    pub fn empty() -> Self {
        Self::from_fn(|_| None)
    }

    /// Creates an `Env` from a fixed set of variables.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_fn(move |name| vars.get(name).cloned())
    }

    /// Creates an `Env` backed by a custom lookup function.
    #[inline]
    pub fn from_fn<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Returns the value of the variable `name`.
    #[inline]
    pub fn var(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    /// Returns the value of the first variable in `names` that is set.
    #[inline]
    pub fn first_var(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.var(name))
    }

    /// Resolves a value with the established fallback order: explicit
    /// config value, then the environment variable `var`.
    ///
    /// When a live resource already exists, this returns `None`: the
    /// resource carries its own credentials and endpoints, and passing
    /// them again would let the two disagree. The caller applies the
    /// library default if the result is `None`.
    pub fn value_or_env(
        &self,
        value: Option<&str>,
        var: Option<&str>,
        resource: Option<&LiveResource>,
    ) -> Option<String> {
        if resource.is_some() {
            return None;
        }
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            return Some(value.to_owned());
        }
        var.and_then(|var| self.var(var))
    }
}

impl Default for Env {
    #[inline]
    fn default() -> Self {
        Self::system()
    }
}

impl Debug for Env {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env").finish_non_exhaustive()
    }
}
