//! Error types for registration and resolution.

use crate::value::CoercionError;
use thiserror::Error;

/// Errors produced by the parameter registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested name matches no registered parameter, neither as given
    /// nor under the `default` group. Carries the unqualified name.
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    /// A parameter with the same qualified name is already registered and
    /// the conflict policy is [`ConflictPolicy::Error`](crate::ConflictPolicy::Error).
    #[error("parameter `{0}` is already registered")]
    DuplicateParameter(String),

    /// An option string (or argument binding) is already claimed by another
    /// parameter.
    #[error("option `{option}` is already bound to parameter `{parameter}`")]
    DuplicateOption {
        /// The contested option string.
        option: String,
        /// Qualified name of the parameter holding the claim.
        parameter: String,
    },

    /// A parameter was declared without any option strings.
    #[error("parameter declared with no option strings")]
    NoOptions,

    /// The winning raw value could not be coerced into the requested type.
    #[error("cannot coerce parameter `{parameter}`: {source}")]
    Coercion {
        /// The parameter name as the caller requested it, without the
        /// implicit `default` group.
        parameter: String,
        /// The underlying coercion failure.
        source: CoercionError,
    },

    /// Setting up the configuration-file watcher failed.
    #[cfg(feature = "watch")]
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
