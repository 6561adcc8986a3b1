//! ConfigService: loads every setting from `<name>.ini` and writes it back.
//!
//! The service owns the whole configuration cycle:
//!
//! - the [`ConfigSnapshot`] the rest of the program reads,
//! - the one live [`IniFile`] store,
//! - the [`ParameterFactory`] and every [`Parameter`] it produced.
//!
//! Construct one instance at start-up and pass it by reference; tests build
//! as many independent instances as they like.
//!
//! # Load / save cycle
//!
//! ```text
//! load_config(name)                      save_config(name, close)
//!   open <name>.ini (missing = empty)      for each parameter:
//!   for each setting, in fixed order:        set_value(snapshot field)
//!     factory.create_parameter               store()
//!     register_to_ini(section, key)        Version ← BUILD_VERSION
//!     load()  (default written back)       write <name>.ini
//!     copy into snapshot (LoadPolicy)      close → release the store
//!   Ok(store was not empty)
//! ```

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::factory::ParameterFactory;
use crate::domain::parameter::{Parameter, ParameterError};
use crate::domain::snapshot::ConfigSnapshot;
use crate::domain::value::{ParamType, ParamValue, ValueError};
use crate::store::{IniFile, KeyValueStore, StoreError, StoreHandle};

pub use crate::domain::snapshot::BUILD_VERSION;

/// INI section names.
pub mod sections {
    pub const AUDIO: &str = "TZFIX.Audio";
    pub const FRAMERATE: &str = "TZFIX.FrameRate";
    pub const RENDER: &str = "TZFIX.Render";
    pub const STEAM: &str = "TZFIX.Steam";
    pub const SYSTEM: &str = "TZFIX.System";
}

/// Error type for configuration load/save operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the INI file failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A parameter was used outside its binding contract.
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// `save_config` was called before `load_config`, or after the store
    /// was released.
    #[error("configuration is not loaded")]
    NotLoaded,

    /// No setting is persisted under this section and key.
    #[error("unknown setting [{section}] {key}")]
    UnknownSetting { section: String, key: String },

    /// The setting is rewritten on every save and cannot be changed.
    #[error("setting [{section}] {key} is read-only")]
    ReadOnlySetting { section: String, key: String },

    /// The supplied text does not parse as the setting's type.
    #[error(transparent)]
    InvalidValue(#[from] ValueError),
}

/// How loaded values are copied into the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Always copy the value in effect after `load()`: the stored value, or
    /// the parameter's default when the key was missing or unparseable.
    #[default]
    CopyEffective,
    /// Copy only values that were actually found in the file.  Missing keys
    /// leave the snapshot field at whatever it held before loading.
    PersistedOnly,
}

/// Options for a [`ConfigService`].
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub load_policy: LoadPolicy,
}

/// A bound parameter as seen from outside the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub label: String,
    pub section: String,
    pub key: String,
    pub value: ParamValue,
    /// `true` if the value was read from the file, `false` for a default.
    pub from_store: bool,
}

/// Resolves `<name>.ini`, appending the extension even if `name` already
/// contains a dot.
pub fn store_path(name: impl AsRef<Path>) -> PathBuf {
    let mut path: OsString = name.as_ref().as_os_str().to_owned();
    path.push(".ini");
    PathBuf::from(path)
}

// ── Parameter table ───────────────────────────────────────────────────────────

struct AudioParams {
    channels: Parameter<i32>,
    sample_rate: Parameter<i32>,
    compatibility: Parameter<bool>,
    enable_fix: Parameter<bool>,
}

struct FramerateParams {
    stutter_fix: Parameter<bool>,
    fudge_factor: Parameter<f32>,
    allow_fake_sleep: Parameter<bool>,
}

struct RenderParams {
    aspect_addr: Parameter<i32>,
    fovy_addr: Parameter<i32>,
    aspect_ratio: Parameter<f32>,
    fovy: Parameter<f32>,
}

struct SteamParams {
    allow_broadcasts: Parameter<bool>,
}

struct SystemParams {
    version: Parameter<String>,
}

const PARAMETER_COUNT: usize = 13;

/// Every persisted parameter, bound to the current store.
struct Parameters {
    audio: AudioParams,
    framerate: FramerateParams,
    render: RenderParams,
    steam: SteamParams,
    system: SystemParams,
}

fn bind<T: ParamType>(
    factory: &mut ParameterFactory,
    store: &StoreHandle,
    label: &str,
    section: &str,
    key: &str,
    default: T,
) -> Result<Parameter<T>, ParameterError> {
    let mut param = factory.create_parameter_with_default(label, default);
    param.register_to_ini(store, section, key)?;
    Ok(param)
}

/// Loads `param` and copies it into `field` according to `policy`.
fn pull<T: ParamType>(
    param: &mut Parameter<T>,
    field: &mut T,
    policy: LoadPolicy,
) -> Result<bool, ParameterError> {
    let found = param.load()?;
    if found || policy == LoadPolicy::CopyEffective {
        *field = param.get_value().clone();
    }
    Ok(found)
}

/// Stages `value` into `param` and pushes it into the store.
fn push<T: ParamType>(param: &mut Parameter<T>, value: &T) -> Result<(), ParameterError> {
    param.set_value(value.clone());
    param.store()
}

fn describe<T: ParamType>(param: &Parameter<T>) -> ParameterInfo {
    ParameterInfo {
        label: param.label().to_string(),
        section: param.section().unwrap_or_default().to_string(),
        key: param.key().unwrap_or_default().to_string(),
        value: param.get_value().clone().into_value(),
        from_store: param.from_store(),
    }
}

impl Parameters {
    /// Creates and binds every parameter.  Defaults come from the built-in
    /// snapshot values.
    fn bind_all(
        factory: &mut ParameterFactory,
        store: &StoreHandle,
    ) -> Result<Self, ParameterError> {
        use sections::*;
        let d = ConfigSnapshot::default();

        Ok(Self {
            audio: AudioParams {
                channels: bind(factory, store, "Audio Channels", AUDIO, "Channels", d.audio.channels)?,
                sample_rate: bind(factory, store, "Sample Rate", AUDIO, "SampleRate", d.audio.sample_hz)?,
                compatibility: bind(
                    factory,
                    store,
                    "Compatibility Mode",
                    AUDIO,
                    "CompatibilityMode",
                    d.audio.compatibility,
                )?,
                enable_fix: bind(factory, store, "Enable Fix", AUDIO, "EnableFix", d.audio.enable_fix)?,
            },
            framerate: FramerateParams {
                stutter_fix: bind(
                    factory,
                    store,
                    "Stutter Elimination",
                    FRAMERATE,
                    "FixStutter",
                    d.framerate.stutter_fix,
                )?,
                fudge_factor: bind(
                    factory,
                    store,
                    "Fudge Factor",
                    FRAMERATE,
                    "FudgeFactor",
                    d.framerate.fudge_factor,
                )?,
                allow_fake_sleep: bind(
                    factory,
                    store,
                    "Allow Fake Sleep",
                    FRAMERATE,
                    "AllowFakeSleep",
                    d.framerate.allow_fake_sleep,
                )?,
            },
            render: RenderParams {
                aspect_addr: bind(
                    factory,
                    store,
                    "Aspect Ratio Memory Address",
                    RENDER,
                    "AspectRatio_Address",
                    d.render.aspect_addr,
                )?,
                fovy_addr: bind(
                    factory,
                    store,
                    "Field of View Vertical Address",
                    RENDER,
                    "FOVY_Address",
                    d.render.fovy_addr,
                )?,
                aspect_ratio: bind(
                    factory,
                    store,
                    "Aspect Ratio",
                    RENDER,
                    "AspectRatio",
                    d.render.aspect_ratio,
                )?,
                fovy: bind(factory, store, "Field of View Vertical", RENDER, "FOVY", d.render.fovy)?,
            },
            steam: SteamParams {
                allow_broadcasts: bind(
                    factory,
                    store,
                    "Allow Steam Broadcasting",
                    STEAM,
                    "AllowBroadcasts",
                    d.steam.allow_broadcasts,
                )?,
            },
            system: SystemParams {
                version: bind(
                    factory,
                    store,
                    "Software Version",
                    SYSTEM,
                    "Version",
                    BUILD_VERSION.to_string(),
                )?,
            },
        })
    }

    /// Loads every parameter into `snap`.  Returns how many were found in
    /// the store.
    fn load_into(
        &mut self,
        snap: &mut ConfigSnapshot,
        policy: LoadPolicy,
    ) -> Result<usize, ParameterError> {
        let found = [
            pull(&mut self.audio.channels, &mut snap.audio.channels, policy)?,
            pull(&mut self.audio.sample_rate, &mut snap.audio.sample_hz, policy)?,
            pull(&mut self.audio.compatibility, &mut snap.audio.compatibility, policy)?,
            pull(&mut self.audio.enable_fix, &mut snap.audio.enable_fix, policy)?,
            pull(&mut self.framerate.stutter_fix, &mut snap.framerate.stutter_fix, policy)?,
            pull(&mut self.framerate.fudge_factor, &mut snap.framerate.fudge_factor, policy)?,
            pull(
                &mut self.framerate.allow_fake_sleep,
                &mut snap.framerate.allow_fake_sleep,
                policy,
            )?,
            pull(&mut self.render.aspect_addr, &mut snap.render.aspect_addr, policy)?,
            pull(&mut self.render.fovy_addr, &mut snap.render.fovy_addr, policy)?,
            pull(&mut self.render.aspect_ratio, &mut snap.render.aspect_ratio, policy)?,
            pull(&mut self.render.fovy, &mut snap.render.fovy, policy)?,
            pull(&mut self.steam.allow_broadcasts, &mut snap.steam.allow_broadcasts, policy)?,
            pull(&mut self.system.version, &mut snap.system.version, policy)?,
        ];
        Ok(found.iter().filter(|f| **f).count())
    }

    /// Pushes every snapshot field into the store.  The version is always the
    /// running build's.
    fn store_from(&mut self, snap: &ConfigSnapshot) -> Result<(), ParameterError> {
        push(&mut self.audio.channels, &snap.audio.channels)?;
        push(&mut self.audio.sample_rate, &snap.audio.sample_hz)?;
        push(&mut self.audio.compatibility, &snap.audio.compatibility)?;
        push(&mut self.audio.enable_fix, &snap.audio.enable_fix)?;
        push(&mut self.framerate.stutter_fix, &snap.framerate.stutter_fix)?;
        push(&mut self.framerate.fudge_factor, &snap.framerate.fudge_factor)?;
        push(&mut self.framerate.allow_fake_sleep, &snap.framerate.allow_fake_sleep)?;
        push(&mut self.render.aspect_addr, &snap.render.aspect_addr)?;
        push(&mut self.render.fovy_addr, &snap.render.fovy_addr)?;
        push(&mut self.render.aspect_ratio, &snap.render.aspect_ratio)?;
        push(&mut self.render.fovy, &snap.render.fovy)?;
        push(&mut self.steam.allow_broadcasts, &snap.steam.allow_broadcasts)?;
        push(&mut self.system.version, &BUILD_VERSION.to_string())?;
        Ok(())
    }

    fn describe_all(&self) -> Vec<ParameterInfo> {
        vec![
            describe(&self.audio.channels),
            describe(&self.audio.sample_rate),
            describe(&self.audio.compatibility),
            describe(&self.audio.enable_fix),
            describe(&self.framerate.stutter_fix),
            describe(&self.framerate.fudge_factor),
            describe(&self.framerate.allow_fake_sleep),
            describe(&self.render.aspect_addr),
            describe(&self.render.fovy_addr),
            describe(&self.render.aspect_ratio),
            describe(&self.render.fovy),
            describe(&self.steam.allow_broadcasts),
            describe(&self.system.version),
        ]
    }
}

/// Parses `text` as `T` and assigns it to `field`.
fn assign<T: ParamType>(field: &mut T, text: &str) -> Result<(), ConfigError> {
    *field = T::from_ini(text)?;
    Ok(())
}

// ── Service ───────────────────────────────────────────────────────────────────

/// Owns the configuration snapshot and its backing INI store.
pub struct ConfigService {
    options: ConfigOptions,
    snapshot: ConfigSnapshot,
    factory: ParameterFactory,
    store: Option<Rc<RefCell<IniFile>>>,
    params: Option<Parameters>,
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(ConfigOptions::default())
    }
}

impl ConfigService {
    /// Creates a service holding the built-in snapshot.  No file is touched
    /// until [`load_config`](Self::load_config).
    pub fn new(options: ConfigOptions) -> Self {
        Self {
            options,
            snapshot: ConfigSnapshot::default(),
            factory: ParameterFactory::new(),
            store: None,
            params: None,
        }
    }

    /// The settings currently in effect.
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Mutable access, e.g. to change a setting before saving.
    pub fn snapshot_mut(&mut self) -> &mut ConfigSnapshot {
        &mut self.snapshot
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    pub fn factory(&self) -> &ParameterFactory {
        &self.factory
    }

    /// `true` between a successful load and a closing save.
    pub fn is_loaded(&self) -> bool {
        self.store.is_some()
    }

    /// The live store, if loaded.
    pub fn store(&self) -> Option<&Rc<RefCell<IniFile>>> {
        self.store.as_ref()
    }

    /// Loads `<name>.ini` into the snapshot.
    ///
    /// Every key missing from the file is filled with its default in the
    /// in-memory store, so a following save writes a complete file.  On a
    /// first run (file missing or without sections) the filled store is
    /// written to disk immediately, so the file exists with every key.
    ///
    /// Returns `false` on a first run, `true` otherwise.  Loading again
    /// starts a new cycle and drops the previous store.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Store`] if the file exists but cannot be read, or the
    /// first-run file cannot be written.
    pub fn load_config(&mut self, name: impl AsRef<Path>) -> Result<bool, ConfigError> {
        let path = store_path(name);
        let ini = IniFile::open(&path)?;
        let empty = ini.is_empty();

        let store = Rc::new(RefCell::new(ini));
        let handle: StoreHandle = store.clone();

        let mut params = Parameters::bind_all(&mut self.factory, &handle)?;
        let found = params.load_into(&mut self.snapshot, self.options.load_policy)?;

        info!(
            "loaded {}: {found} of {PARAMETER_COUNT} settings stored{}",
            path.display(),
            if empty { " (first run)" } else { "" }
        );

        if empty {
            store.borrow().write(&path)?;
            info!("created {} with default settings", path.display());
        }

        self.store = Some(store);
        self.params = Some(params);
        Ok(!empty)
    }

    /// Writes the snapshot back to `<name>.ini`.
    ///
    /// Every field is written unconditionally and the version key is set to
    /// [`BUILD_VERSION`].  With `close` the store is released afterwards and
    /// the service must be loaded again before the next save.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotLoaded`] without a prior load, or
    /// [`ConfigError::Store`] if the file cannot be written.
    pub fn save_config(&mut self, name: impl AsRef<Path>, close: bool) -> Result<(), ConfigError> {
        let (Some(store), Some(params)) = (self.store.as_ref(), self.params.as_mut()) else {
            return Err(ConfigError::NotLoaded);
        };

        params.store_from(&self.snapshot)?;

        let path = store_path(name);
        store.borrow().write(&path)?;
        info!("saved {}", path.display());

        if close {
            self.close();
        }
        Ok(())
    }

    /// Releases the store and every parameter bound to it.
    pub fn close(&mut self) {
        if self.store.take().is_some() {
            debug!("configuration store released");
        }
        self.params = None;
    }

    /// Lists every bound parameter in load order.  Empty when not loaded.
    pub fn parameters(&self) -> Vec<ParameterInfo> {
        self.params
            .as_ref()
            .map(Parameters::describe_all)
            .unwrap_or_default()
    }

    /// Sets the snapshot field persisted under `(section, key)` from its INI
    /// text form.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownSetting`] for a key that is not persisted,
    /// [`ConfigError::ReadOnlySetting`] for the version, and
    /// [`ConfigError::InvalidValue`] if `text` does not parse.
    pub fn set_from_text(&mut self, section: &str, key: &str, text: &str) -> Result<(), ConfigError> {
        use sections::*;
        let snap = &mut self.snapshot;

        match (section, key) {
            (AUDIO, "Channels") => assign(&mut snap.audio.channels, text),
            (AUDIO, "SampleRate") => assign(&mut snap.audio.sample_hz, text),
            (AUDIO, "CompatibilityMode") => assign(&mut snap.audio.compatibility, text),
            (AUDIO, "EnableFix") => assign(&mut snap.audio.enable_fix, text),
            (FRAMERATE, "FixStutter") => assign(&mut snap.framerate.stutter_fix, text),
            (FRAMERATE, "FudgeFactor") => assign(&mut snap.framerate.fudge_factor, text),
            (FRAMERATE, "AllowFakeSleep") => assign(&mut snap.framerate.allow_fake_sleep, text),
            (RENDER, "AspectRatio_Address") => assign(&mut snap.render.aspect_addr, text),
            (RENDER, "FOVY_Address") => assign(&mut snap.render.fovy_addr, text),
            (RENDER, "AspectRatio") => assign(&mut snap.render.aspect_ratio, text),
            (RENDER, "FOVY") => assign(&mut snap.render.fovy, text),
            (STEAM, "AllowBroadcasts") => assign(&mut snap.steam.allow_broadcasts, text),
            (SYSTEM, "Version") => Err(ConfigError::ReadOnlySetting {
                section: section.to_string(),
                key: key.to_string(),
            }),
            _ => Err(ConfigError::UnknownSetting {
                section: section.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
