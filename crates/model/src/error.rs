use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The configuration is incomplete or invalid: the class is unspecified
    /// or unrecognized, a required field is missing, or a value has the
    /// wrong shape.
    Configuration,
    /// The credentials resolved to nothing from every fallback tier.
    ProviderAuth,
    /// The live resource cannot be opened or has already been released.
    ProviderUnavailable,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "Configuration error"),
            ErrorKind::ProviderAuth => write!(f, "Provider auth error"),
            ErrorKind::ProviderUnavailable => {
                write!(f, "Provider unavailable")
            }
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}

/// The error type shared by the factory, the policies and the providers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    /// Creates an error with the given kind and message.
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Creates a new error with the `Configuration` kind.
    #[inline]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Creates a new error with the `ProviderAuth` kind.
    #[inline]
    pub fn provider_auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderAuth, message)
    }

    /// Creates a new error with the `ProviderUnavailable` kind.
    #[inline]
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderUnavailable, message)
    }

    /// Creates a new error with the `Other` kind.
    #[inline]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Other, message)
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::configuration("class unspecified");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.message(), "class unspecified");
        assert_eq!(
            format!("{err}"),
            "Configuration error: class unspecified"
        );
    }
}
