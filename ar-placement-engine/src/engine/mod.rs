/// AR camera following the viewer pose.
pub mod camera;

/// App construction, state machine, settings and window configuration.
pub mod core;

/// Engine-owned scene content: reticle and simulated floor.
pub mod scene;

/// Runtime overlays and diagnostics.
pub mod systems;
