//! INI text codec and file persistence.
//!
//! File format:
//! ```text
//! [TZFIX.Audio]
//! Channels=6
//! SampleRate=44100
//!
//! [TZFIX.FrameRate]
//! FudgeFactor=1.666666
//! ```
//!
//! Sections and keys keep the order they were first seen in, so a file that
//! is loaded and written back without changes comes out byte-identical.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use super::{KeyValueStore, StoreError};

const UTF8_BOM: char = '\u{feff}';
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];

/// Turns raw file bytes into text, tolerating hand-edited encodings.
fn decode(path: &Path, bytes: Vec<u8>) -> String {
    if let Some(wide) = bytes.strip_prefix(UTF16LE_BOM) {
        let units: Vec<u16> = wide
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        debug!("{} is UTF-16LE", path.display());
        return String::from_utf16_lossy(&units);
    }

    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "{} is not valid UTF-8 (first bad byte at offset {}), replacing invalid bytes",
                path.display(),
                e.utf8_error().valid_up_to()
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

fn is_line_break(c: char) -> bool {
    c == '\r' || c == '\n'
}

/// One `[Section]` block and its `Key=Value` entries in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Section name as written between the brackets.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates the `(key, value)` pairs in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys in this section.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the section has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key`, keeping its position if it already exists.
    ///
    /// Values are single-line: each `\r` or `\n` is replaced with a space so
    /// a value can never start a new key or section when written out.
    pub fn set(&mut self, key: &str, value: String) {
        let value = if value.contains(is_line_break) {
            warn!("[{}] {key}: line breaks in value replaced with spaces", self.name);
            value.replace(is_line_break, " ")
        } else {
            value
        };
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }
}

/// In-memory representation of an INI file.
///
/// The `empty` flag is computed once, when the text is parsed: it stays
/// `true` for a store that started without sections even after parameters
/// have written their defaults into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniFile {
    sections: Vec<IniSection>,
    empty: bool,
}

impl Default for IniFile {
    fn default() -> Self {
        Self::new()
    }
}

impl IniFile {
    /// Creates a store with no sections (`is_empty()` is `true`).
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            empty: true,
        }
    }

    /// Loads `path`.  A file that does not exist yields an empty store.
    ///
    /// The file is decoded as UTF-16LE when it starts with that byte order
    /// mark, otherwise as UTF-8.  Invalid UTF-8 is replaced with U+FFFD and
    /// logged rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] for any failure other than "not found".
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => {
                let file = Self::parse(&decode(path, bytes));
                info!(
                    "loaded {} ({} sections)",
                    path.display(),
                    file.sections.len()
                );
                Ok(file)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, starting with an empty store", path.display());
                Ok(Self::new())
            }
            Err(source) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses INI text.
    ///
    /// Blank lines and `;` / `#` comments are ignored.  Lines outside any
    /// section or without an `=` are skipped with a warning.  A repeated key
    /// keeps its first position and takes the last value.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        let mut sections: Vec<IniSection> = Vec::new();
        let mut current: Option<usize> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim();
                current = Some(match sections.iter().position(|s| s.name == name) {
                    Some(existing) => existing,
                    None => {
                        sections.push(IniSection::new(name));
                        sections.len() - 1
                    }
                });
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                warn!("line {line_no}: expected Key=Value, skipping {line:?}");
                continue;
            };

            let Some(section) = current else {
                warn!("line {line_no}: key outside of any section, skipping {line:?}");
                continue;
            };

            sections[section].set(key.trim(), value.trim().to_string());
        }

        let empty = sections.is_empty();
        Self { sections, empty }
    }

    /// Renders the store as INI text.
    ///
    /// Every section is followed by a blank line.  The output depends only
    /// on the contents, never on how they were produced.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in section.entries() {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Writes the serialized store to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory or file cannot be written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(path, self.serialize()).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("wrote {}", path.display());
        Ok(())
    }

    /// All sections in file order.
    pub fn get_sections(&self) -> &[IniSection] {
        &self.sections
    }

    /// Looks up a section by its exact name.
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    fn section_mut(&mut self, name: &str) -> &mut IniSection {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(IniSection::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }
}

impl KeyValueStore for IniFile {
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    fn set(&mut self, section: &str, key: &str, value: String) {
        self.section_mut(section).set(key, value);
    }

    fn is_empty(&self) -> bool {
        self.empty
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
