//! Tales of Zestiria "Fix" configuration tool: entry point.
//!
//! Runs the same load/save cycle the fix runs at start-up, so a config file
//! can be created, inspected or edited without launching the game.
//!
//! # Usage
//!
//! ```text
//! tzfix [--config <NAME>] <COMMAND>
//!
//! Commands:
//!   load                       Load and save back, creating missing keys
//!   show                       Print every setting and where it came from
//!   set <SECTION.KEY> <VALUE>  Change one setting and save
//!   export [--format toml|json]
//!                              Print the loaded snapshot
//! ```
//!
//! `NAME` is the config path without the `.ini` extension.  It defaults to
//! `tzfix` and can be overridden with the `TZFIX_CONFIG` environment
//! variable.  Log verbosity is controlled by `RUST_LOG`.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tzfix_core::{ConfigService, BUILD_VERSION};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Inspect and edit the Tales of Zestiria "Fix" configuration.
#[derive(Debug, Parser)]
#[command(name = "tzfix", about = "Tales of Zestiria \"Fix\" configuration tool", version)]
struct Cli {
    /// Config file name without the `.ini` extension.
    #[arg(long, default_value = "tzfix", env = "TZFIX_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Load the config and write it back, filling in any missing keys.
    Load,
    /// Print every setting as `Section.Key = value (source)`.
    Show,
    /// Change one setting, e.g. `set TZFIX.Audio.Channels 2`.
    Set {
        /// `Section.Key`; the key is everything after the last dot.
        setting: String,
        value: String,
    },
    /// Print the loaded settings in a machine-readable format.
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Toml)]
        format: ExportFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Toml,
    Json,
}

/// Splits `TZFIX.Audio.Channels` into `("TZFIX.Audio", "Channels")`.
fn split_setting(setting: &str) -> anyhow::Result<(&str, &str)> {
    match setting.rsplit_once('.') {
        Some((section, key)) if !section.is_empty() && !key.is_empty() => Ok((section, key)),
        _ => bail!("expected SECTION.KEY, got '{setting}'"),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Executes `cli` and returns what should be printed.
fn run(cli: Cli) -> anyhow::Result<String> {
    let name = cli.config.as_str();
    let mut service = ConfigService::default();
    let existed = service
        .load_config(name)
        .with_context(|| format!("failed to load config '{name}'"))?;

    match cli.command {
        Command::Load => {
            service
                .save_config(name, true)
                .with_context(|| format!("failed to save config '{name}'"))?;
            if existed {
                Ok(format!("{name}.ini is up to date (version {BUILD_VERSION})"))
            } else {
                Ok(format!("{name}.ini created with default settings"))
            }
        }
        Command::Show => {
            let lines: Vec<String> = service
                .parameters()
                .iter()
                .map(|p| {
                    let source = if p.from_store { "stored" } else { "default" };
                    format!("{}.{} = {} ({source})", p.section, p.key, p.value)
                })
                .collect();
            Ok(lines.join("\n"))
        }
        Command::Set { setting, value } => {
            let (section, key) = split_setting(&setting)?;
            service
                .set_from_text(section, key, &value)
                .with_context(|| format!("cannot set {setting}"))?;
            service
                .save_config(name, true)
                .with_context(|| format!("failed to save config '{name}'"))?;
            info!("{setting} set to {value}");
            Ok(format!("{setting} = {value}"))
        }
        Command::Export { format } => match format {
            ExportFormat::Toml => toml::to_string_pretty(service.snapshot())
                .context("failed to serialize settings as TOML"),
            ExportFormat::Json => serde_json::to_string_pretty(service.snapshot())
                .context("failed to serialize settings as JSON"),
        },
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = run(cli)?;
    println!("{output}");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_config() -> (PathBuf, String) {
        let dir = std::env::temp_dir().join(format!("tzfix_cli_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let name = dir.join("tzfix").to_string_lossy().into_owned();
        (dir, name)
    }

    fn cli(config: &str, args: &[&str]) -> Cli {
        let mut argv = vec!["tzfix", "--config", config];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    // ── Argument parsing ──────────────────────────────────────────────────────

    #[test]
    fn test_cli_parses_set_command() {
        let cli = Cli::parse_from(["tzfix", "set", "TZFIX.Audio.Channels", "2"]);
        assert_eq!(
            cli.command,
            Command::Set {
                setting: "TZFIX.Audio.Channels".to_string(),
                value: "2".to_string(),
            }
        );
    }

    #[test]
    fn test_cli_config_override() {
        let cli = Cli::parse_from(["tzfix", "--config", "other", "show"]);
        assert_eq!(cli.config, "other");
        assert_eq!(cli.command, Command::Show);
    }

    #[test]
    fn test_cli_export_format_defaults_to_toml() {
        let cli = Cli::parse_from(["tzfix", "export"]);
        assert_eq!(
            cli.command,
            Command::Export {
                format: ExportFormat::Toml
            }
        );
    }

    #[test]
    fn test_cli_export_format_json() {
        let cli = Cli::parse_from(["tzfix", "export", "--format", "json"]);
        assert_eq!(
            cli.command,
            Command::Export {
                format: ExportFormat::Json
            }
        );
    }

    #[test]
    fn test_cli_rejects_missing_command() {
        assert!(Cli::try_parse_from(["tzfix"]).is_err());
    }

    #[test]
    fn test_split_setting_uses_last_dot() {
        assert_eq!(
            split_setting("TZFIX.Render.FOVY_Address").unwrap(),
            ("TZFIX.Render", "FOVY_Address")
        );
    }

    #[test]
    fn test_split_setting_rejects_missing_key() {
        assert!(split_setting("Channels").is_err());
        assert!(split_setting("TZFIX.Audio.").is_err());
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    #[test]
    fn test_load_creates_file_on_first_run() {
        // Arrange
        let (dir, name) = temp_config();

        // Act
        let output = run(cli(&name, &["load"])).unwrap();

        // Assert
        assert!(output.contains("created"));
        assert!(dir.join("tzfix.ini").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_set_then_show_reports_stored_value() {
        // Arrange
        let (dir, name) = temp_config();

        // Act
        run(cli(&name, &["set", "TZFIX.Audio.Channels", "2"])).unwrap();
        let shown = run(cli(&name, &["show"])).unwrap();

        // Assert
        assert!(shown.contains("TZFIX.Audio.Channels = 2 (stored)"));
        assert_eq!(shown.lines().count(), 13);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_set_rejects_invalid_value() {
        let (dir, name) = temp_config();

        let result = run(cli(&name, &["set", "TZFIX.Audio.EnableFix", "maybe"]));

        assert!(result.is_err());
        let text = std::fs::read_to_string(dir.join("tzfix.ini")).unwrap();
        assert!(text.contains("EnableFix=true"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_export_json_contains_snapshot_groups() {
        let (dir, name) = temp_config();

        let output = run(cli(&name, &["export", "--format", "json"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["audio"]["channels"], 6);
        assert_eq!(value["system"]["version"], BUILD_VERSION);

        std::fs::remove_dir_all(&dir).ok();
    }
}
