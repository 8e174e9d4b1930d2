#![warn(missing_docs)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

pub(crate) mod context;
pub(crate) mod declaration;
pub(crate) mod error;
pub(crate) mod expand;
pub(crate) mod layers;
pub(crate) mod registry;
pub(crate) mod value;
#[cfg(feature = "watch")]
pub(crate) mod watch;

pub use context::{Context, EnvSource, MockEnv, StdEnv};
pub use declaration::{Action, Declaration, EnvPrefix, Parameter, Source, Sources};
pub use error::{Error, Result};
pub use registry::{ConflictPolicy, Registry};
pub use value::{CoercionError, FromValue, Value};
#[cfg(feature = "watch")]
pub use watch::Watch;
