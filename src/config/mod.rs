//! Configuration management for the instant-domains client
//!
//! This module handles loading and managing configuration settings
//! for both library use and the script-mode binary.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::Settings;
