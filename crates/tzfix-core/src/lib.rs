//! # tzfix-core
//!
//! Typed configuration parameters for Tales of Zestiria "Fix", bound to a
//! human-editable INI file with automatic default fallback.
//!
//! # Architecture overview
//!
//! The crate follows the same layering as the rest of the workspace:
//!
//! - **`store`** – The backing key/value store.  [`store::IniFile`] reads and
//!   writes `[Section]` / `Key=Value` text; the rest of the crate only talks
//!   to it through the [`store::KeyValueStore`] trait.
//!
//! - **`domain`** – Pure types with no file I/O: typed values, the
//!   [`Parameter`] unit that binds a default to a `(section, key)` location,
//!   the [`ParameterFactory`], and the flat [`ConfigSnapshot`] consumed by the
//!   rest of the program.
//!
//! - **`application`** – [`ConfigService`], which loads every parameter in a
//!   fixed order, copies values into the snapshot, and writes them back.
//!
//! ```text
//! ConfigService::load_config("tzfix")
//!   └─ IniFile::open("tzfix.ini")
//!   └─ for each setting:
//!        ParameterFactory::create_parameter
//!        Parameter::register_to_ini(store, section, key)
//!        Parameter::load()   -- stored value, or default written back
//!        snapshot.<group>.<field> = value
//! ```

pub mod application;
pub mod domain;
pub mod store;

pub use application::config_service::{
    ConfigError, ConfigOptions, ConfigService, LoadPolicy, ParameterInfo, BUILD_VERSION,
};
pub use domain::factory::ParameterFactory;
pub use domain::parameter::{BindingState, Parameter, ParameterError};
pub use domain::snapshot::ConfigSnapshot;
pub use domain::value::{ParamKind, ParamType, ParamValue, ValueError};
pub use store::{IniFile, KeyValueStore, StoreError, StoreHandle};
