//! The flat configuration snapshot read by the rest of the program.
//!
//! [`ConfigSnapshot`] is plain data: one field per setting, grouped the way
//! the consuming subsystems use them.  It never references the parameters
//! that fill it.
//!
//! The `Default` values are the built-in settings the fix ships with; they
//! also serve as each parameter's default when the INI file lacks a key.

use serde::{Deserialize, Serialize};

/// Version string of the running build, written to `TZFIX.System.Version`.
pub const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Every setting currently in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub framerate: FramerateConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub steam: SteamConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

/// Audio output format override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub channels: i32,
    pub sample_hz: i32,
    pub compatibility: bool,
    pub enable_fix: bool,
}

/// Frame pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramerateConfig {
    pub stutter_fix: bool,
    pub fudge_factor: f32,
    pub allow_fake_sleep: bool,
}

/// Render parameters and the memory addresses they are patched at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub aspect_ratio: f32,
    pub fovy: f32,
    pub aspect_addr: i32,
    pub fovy_addr: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SteamConfig {
    pub allow_broadcasts: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Version recorded in the INI file when it was loaded.
    pub version: String,
    /// Not persisted.
    #[serde(default)]
    pub intro_video: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channels: 6,
            sample_hz: 44100,
            compatibility: false,
            enable_fix: true,
        }
    }
}

impl Default for FramerateConfig {
    fn default() -> Self {
        Self {
            stutter_fix: true,
            fudge_factor: 1.666_666,
            allow_fake_sleep: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.777_778,
            fovy: 0.785_398,
            aspect_addr: 0x00D5_6494,
            fovy_addr: 0x00D5_6498,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            version: BUILD_VERSION.to_string(),
            intro_video: String::new(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
