//! Runtime overlays for native builds.
//!
//! Web builds leave UI to the page; the start control is the page's own button.

/// FPS readout, session status line and the START AR button.
#[cfg(not(target_arch = "wasm32"))]
pub mod hud;
