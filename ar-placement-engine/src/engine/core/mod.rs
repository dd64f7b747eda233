//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration, runtime settings
//! and plugin initialisation for both native and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with the AR frame loop, settings loading and
/// platform-specific overlays.
pub mod app_setup;

/// Application state machine: settings loading, then runtime.
pub mod app_state;

/// Runtime settings asset and its loading systems.
pub mod settings;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
