//! Domain types for the configuration core.
//!
//! Nothing in this module opens a file.  Parameters reach their backing
//! store only through the [`crate::store::KeyValueStore`] trait, which keeps
//! every type here testable against an in-memory store.

/// Typed values and their INI text form.
pub mod value;

/// `Parameter<T>` and its binding lifecycle.
pub mod parameter;

/// The `ParameterFactory`.
pub mod factory;

/// The flat `ConfigSnapshot` consumed by the rest of the program.
pub mod snapshot;

pub use factory::ParameterFactory;
pub use parameter::{BindingState, Parameter, ParameterError};
pub use snapshot::ConfigSnapshot;
pub use value::{ParamKind, ParamType, ParamValue, ValueError};
