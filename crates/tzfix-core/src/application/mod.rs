//! Application layer for the configuration core.
//!
//! Use cases live here.  They orchestrate domain types and the INI store
//! without owning any parsing or formatting rules themselves.

/// Loads and saves the full configuration.
pub mod config_service;
