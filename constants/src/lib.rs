pub mod placement;
pub mod render_settings;
pub mod reticle;
pub mod session;
pub mod simulation;
