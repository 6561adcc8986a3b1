//! Backing store: the section-keyed text file parameters persist into.
//!
//! The domain layer never sees a file.  It talks to a [`KeyValueStore`],
//! which is implemented by:
//!
//! - [`IniFile`] – the real `[Section]` / `Key=Value` file on disk.
//! - [`memory::MemoryStore`] – an in-memory map used by unit tests.
//!
//! # Sharing the store
//!
//! Exactly one store is live per configuration cycle.  The orchestrator owns
//! it through a [`StoreHandle`]; every bound parameter keeps only a `Weak`
//! reference, so dropping the handle releases the store for all of them.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;

pub mod ini;
pub mod memory;

pub use ini::{IniFile, IniSection};
pub use memory::MemoryStore;

/// Shared, single-threaded handle to a backing store.
pub type StoreHandle = Rc<RefCell<dyn KeyValueStore>>;

/// Error type for backing store file operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Interface between parameters and whatever holds their string values.
///
/// Section and key names are case-sensitive literals.  Implementations must
/// never rename or invent keys.
pub trait KeyValueStore {
    /// Returns the raw string stored under `(section, key)`, if any.
    fn get(&self, section: &str, key: &str) -> Option<&str>;

    /// Stores `value` under `(section, key)`, creating the section if needed.
    fn set(&mut self, section: &str, key: &str, value: String);

    /// `true` if the store held no sections when it was loaded.
    fn is_empty(&self) -> bool;
}
