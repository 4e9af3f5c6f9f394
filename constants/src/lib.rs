//! Shared constants for the splat sorting workspace.

/// Radix digit layout and key width policy.
pub mod sorting;

/// Key/index and prefix-sum texture sizing.
pub mod texture;

/// Default values for the runtime sort configuration.
pub mod sort_settings;

/// Viewer asset paths and demo scene sizing.
pub mod viewer;
