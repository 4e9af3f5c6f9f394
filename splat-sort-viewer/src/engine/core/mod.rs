//! Core application setup.
//!
//! Handles plugin initialisation and window configuration for both native
//! and WASM targets.

/// Builds the app: default plugins, the splat sort plugin and viewer systems.
pub mod app_setup;

/// Platform-specific window configuration for native and WASM builds.
pub mod window_config;
