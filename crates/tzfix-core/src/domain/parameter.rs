//! `Parameter<T>`: a typed setting bound to one `(section, key)` of a store.
//!
//! # Binding lifecycle
//!
//! ```text
//! Unbound  ──register_to_ini──►  Bound  ──load / store──►  Synchronized
//! ```
//!
//! - `Unbound`: created by the factory; default set, no store attached.
//! - `Bound`: a store, section and key are attached.  No I/O has happened.
//! - `Synchronized`: `load()` or `store()` has run at least once.
//!
//! A parameter binds exactly once.  It holds only a `Weak` reference to the
//! store, so releasing the store elsewhere turns further I/O into
//! [`ParameterError::StoreReleased`] instead of a dangling access.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;
use tracing::{debug, warn};

use super::value::{ParamKind, ParamType};
use crate::store::{KeyValueStore, StoreHandle};

/// Errors raised by misuse of a [`Parameter`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParameterError {
    /// `load()` or `store()` was called before `register_to_ini()`.
    #[error("parameter {label:?} is not bound to a store")]
    Unbound { label: String },

    /// `register_to_ini()` was called a second time.
    #[error("parameter {label:?} is already bound to [{section}] {key}")]
    AlreadyBound {
        label: String,
        section: String,
        key: String,
    },

    /// The store this parameter was bound to has been dropped.
    #[error("store backing [{section}] {key} has been released")]
    StoreReleased { section: String, key: String },
}

/// Where a parameter is in its binding lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Bound,
    Synchronized,
}

#[derive(Debug)]
struct Binding {
    store: Weak<RefCell<dyn KeyValueStore>>,
    section: String,
    key: String,
}

/// A typed configuration value with a default and an optional store binding.
#[derive(Debug)]
pub struct Parameter<T: ParamType> {
    label: String,
    default: T,
    value: T,
    from_store: bool,
    binding: Option<Binding>,
    state: BindingState,
}

impl<T: ParamType> Parameter<T> {
    /// Creates an unbound parameter whose current value is `default`.
    pub(crate) fn new(label: impl Into<String>, default: T) -> Self {
        Self {
            label: label.into(),
            value: default.clone(),
            default,
            from_store: false,
            binding: None,
            state: BindingState::Unbound,
        }
    }

    /// Attaches this parameter to `(section, key)` inside `store`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::AlreadyBound`] if the parameter is already
    /// bound; the original binding is kept.
    pub fn register_to_ini(
        &mut self,
        store: &StoreHandle,
        section: &str,
        key: &str,
    ) -> Result<(), ParameterError> {
        if let Some(existing) = &self.binding {
            return Err(ParameterError::AlreadyBound {
                label: self.label.clone(),
                section: existing.section.clone(),
                key: existing.key.clone(),
            });
        }

        debug!("binding {:?} to [{section}] {key}", self.label);
        self.binding = Some(Binding {
            store: Rc::downgrade(store),
            section: section.to_string(),
            key: key.to_string(),
        });
        self.state = BindingState::Bound;
        Ok(())
    }

    /// Pulls the value from the bound store.
    ///
    /// Returns `true` when the stored text was present and parsed.  Otherwise
    /// the current value is reset to the default, the default is written into
    /// the store (replacing unparseable text), and `false` is returned.
    ///
    /// # Errors
    ///
    /// [`ParameterError::Unbound`] before `register_to_ini()`, or
    /// [`ParameterError::StoreReleased`] if the store is gone.
    pub fn load(&mut self) -> Result<bool, ParameterError> {
        let binding = self.binding.as_ref().ok_or_else(|| ParameterError::Unbound {
            label: self.label.clone(),
        })?;
        let store = binding
            .store
            .upgrade()
            .ok_or_else(|| ParameterError::StoreReleased {
                section: binding.section.clone(),
                key: binding.key.clone(),
            })?;

        let stored = store
            .borrow()
            .get(&binding.section, &binding.key)
            .map(str::to_owned);

        let parsed = match stored {
            Some(text) => match T::from_ini(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(
                        "[{}] {}: {e}, falling back to default",
                        binding.section, binding.key
                    );
                    None
                }
            },
            None => None,
        };

        let found = match parsed {
            Some(value) => {
                self.value = value;
                true
            }
            None => {
                self.value = self.default.clone();
                store
                    .borrow_mut()
                    .set(&binding.section, &binding.key, self.default.to_ini());
                false
            }
        };

        debug!(
            "[{}] {} = {:?} ({})",
            binding.section,
            binding.key,
            self.value,
            if found { "stored" } else { "default" }
        );
        self.from_store = found;
        self.state = BindingState::Synchronized;
        Ok(found)
    }

    /// Pushes the current value into the bound store.  Nothing is written to
    /// disk; the store owner does that once for all parameters.
    ///
    /// # Errors
    ///
    /// Same conditions as [`load`](Self::load).
    pub fn store(&mut self) -> Result<(), ParameterError> {
        let binding = self.binding.as_ref().ok_or_else(|| ParameterError::Unbound {
            label: self.label.clone(),
        })?;
        let store = binding
            .store
            .upgrade()
            .ok_or_else(|| ParameterError::StoreReleased {
                section: binding.section.clone(),
                key: binding.key.clone(),
            })?;

        store
            .borrow_mut()
            .set(&binding.section, &binding.key, self.value.to_ini());
        self.state = BindingState::Synchronized;
        Ok(())
    }

    /// The current in-memory value.
    pub fn get_value(&self) -> &T {
        &self.value
    }

    /// Replaces the current in-memory value.
    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }

    /// Human-readable label, for display only.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ParamKind {
        T::KIND
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    /// `true` if the last `load()` found a valid stored value.
    pub fn from_store(&self) -> bool {
        self.from_store
    }

    pub fn section(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.section.as_str())
    }

    pub fn key(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.key.as_str())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{IniFile, MemoryStore};

    fn memory(values: &[(&str, &str, &str)]) -> (Rc<RefCell<MemoryStore>>, StoreHandle) {
        let store = Rc::new(RefCell::new(MemoryStore::with_values(values.iter().copied())));
        let handle: StoreHandle = store.clone();
        (store, handle)
    }

    // ── Binding ───────────────────────────────────────────────────────────────

    #[test]
    fn test_new_parameter_is_unbound_with_default_value() {
        let param = Parameter::new("Audio Channels", 6);
        assert_eq!(param.state(), BindingState::Unbound);
        assert_eq!(*param.get_value(), 6);
        assert_eq!(param.section(), None);
        assert_eq!(param.kind(), ParamKind::Int);
    }

    #[test]
    fn test_register_to_ini_moves_to_bound() {
        // Arrange
        let (_store, handle) = memory(&[]);
        let mut param = Parameter::new("Audio Channels", 6);

        // Act
        param
            .register_to_ini(&handle, "TZFIX.Audio", "Channels")
            .expect("first bind");

        // Assert
        assert_eq!(param.state(), BindingState::Bound);
        assert_eq!(param.section(), Some("TZFIX.Audio"));
        assert_eq!(param.key(), Some("Channels"));
    }

    #[test]
    fn test_register_twice_is_rejected_and_keeps_first_binding() {
        // Arrange
        let (_store, handle) = memory(&[]);
        let mut param = Parameter::new("Audio Channels", 6);
        param.register_to_ini(&handle, "A", "One").unwrap();

        // Act
        let result = param.register_to_ini(&handle, "B", "Two");

        // Assert
        assert!(matches!(result, Err(ParameterError::AlreadyBound { .. })));
        assert_eq!(param.section(), Some("A"));
        assert_eq!(param.key(), Some("One"));
    }

    #[test]
    fn test_load_while_unbound_is_an_error() {
        let mut param = Parameter::new("Fudge Factor", 1.0_f32);
        assert_eq!(
            param.load(),
            Err(ParameterError::Unbound {
                label: "Fudge Factor".to_string()
            })
        );
        assert_eq!(param.state(), BindingState::Unbound);
    }

    #[test]
    fn test_store_while_unbound_is_an_error() {
        let mut param = Parameter::new("Fudge Factor", 1.0_f32);
        assert!(matches!(param.store(), Err(ParameterError::Unbound { .. })));
    }

    // ── load() ────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_present_key_returns_true_and_parses_value() {
        // Arrange
        let (store, handle) = memory(&[("TZFIX.Audio", "SampleRate", "48000")]);
        let mut param = Parameter::new("Sample Rate", 44100);
        param.register_to_ini(&handle, "TZFIX.Audio", "SampleRate").unwrap();

        // Act
        let found = param.load().expect("load");

        // Assert
        assert!(found);
        assert!(param.from_store());
        assert_eq!(*param.get_value(), 48000);
        assert_eq!(param.state(), BindingState::Synchronized);
        assert!(store.borrow().writes().is_empty(), "present key must not be rewritten");
    }

    #[test]
    fn test_load_missing_key_returns_false_and_writes_default() {
        // Arrange
        let (store, handle) = memory(&[]);
        let mut param = Parameter::new("Enable Fix", true);
        param.register_to_ini(&handle, "TZFIX.Audio", "EnableFix").unwrap();
        param.set_value(false);

        // Act
        let found = param.load().expect("load");

        // Assert
        assert!(!found);
        assert!(!param.from_store());
        assert!(*param.get_value(), "value resets to the default");
        assert_eq!(store.borrow().get("TZFIX.Audio", "EnableFix"), Some("true"));
    }

    #[test]
    fn test_load_unparseable_value_falls_back_to_default() {
        // Arrange
        let (store, handle) = memory(&[("TZFIX.FrameRate", "FudgeFactor", "fast")]);
        let mut param = Parameter::new("Fudge Factor", 1.5_f32);
        param
            .register_to_ini(&handle, "TZFIX.FrameRate", "FudgeFactor")
            .unwrap();

        // Act
        let found = param.load().expect("load");

        // Assert
        assert!(!found);
        assert_eq!(*param.get_value(), 1.5);
        assert_eq!(
            store.borrow().get("TZFIX.FrameRate", "FudgeFactor"),
            Some("1.5"),
            "bad text is replaced with the default"
        );
    }

    #[test]
    fn test_load_string_keeps_text_verbatim() {
        let (_store, handle) = memory(&[("TZFIX.System", "Version", "0.2.0")]);
        let mut param = Parameter::new("Software Version", String::new());
        param.register_to_ini(&handle, "TZFIX.System", "Version").unwrap();

        assert!(param.load().unwrap());
        assert_eq!(param.get_value(), "0.2.0");
    }

    // ── store() ───────────────────────────────────────────────────────────────

    #[test]
    fn test_store_writes_current_value() {
        // Arrange
        let (store, handle) = memory(&[("TZFIX.Steam", "AllowBroadcasts", "false")]);
        let mut param = Parameter::new("Allow Steam Broadcasting", false);
        param
            .register_to_ini(&handle, "TZFIX.Steam", "AllowBroadcasts")
            .unwrap();

        // Act
        param.set_value(true);
        param.store().expect("store");

        // Assert
        assert_eq!(store.borrow().get("TZFIX.Steam", "AllowBroadcasts"), Some("true"));
        assert_eq!(param.state(), BindingState::Synchronized);
    }

    #[test]
    fn test_store_into_ini_file_creates_section() {
        // Arrange
        let ini = Rc::new(RefCell::new(IniFile::new()));
        let handle: StoreHandle = ini.clone();
        let mut param = Parameter::new("Aspect Ratio", 1.777_778_f32);
        param.register_to_ini(&handle, "TZFIX.Render", "AspectRatio").unwrap();

        // Act
        param.store().unwrap();

        // Assert
        assert_eq!(ini.borrow().serialize(), "[TZFIX.Render]\nAspectRatio=1.777778\n\n");
    }

    // ── Released store ────────────────────────────────────────────────────────

    #[test]
    fn test_io_after_store_dropped_reports_released() {
        // Arrange
        let (store, handle) = memory(&[]);
        let mut param = Parameter::new("Audio Channels", 6);
        param.register_to_ini(&handle, "TZFIX.Audio", "Channels").unwrap();

        // Act: drop every strong reference
        drop(handle);
        drop(store);

        // Assert
        let expected = ParameterError::StoreReleased {
            section: "TZFIX.Audio".to_string(),
            key: "Channels".to_string(),
        };
        assert_eq!(param.load(), Err(expected.clone()));
        assert_eq!(param.store(), Err(expected));
    }
}
