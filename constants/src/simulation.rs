use bevy::color::Color;

/// Eye height of the simulated viewer above the floor (metres)
pub const SIM_VIEWER_HEIGHT: f32 = 1.6;

/// Initial downward pitch so the floor is in view on start (radians)
pub const SIM_VIEWER_PITCH: f32 = -0.6;

/// Height of the simulated floor plane
pub const SIM_FLOOR_HEIGHT: f32 = 0.0;

/// Hit tests further away than this report no surface (metres)
pub const SIM_MAX_HIT_DISTANCE: f32 = 8.0;

/// Walking speed of the simulated viewer (metres per second)
pub const SIM_MOVE_SPEED: f32 = 1.4;

/// Features the simulated device can grant
pub const SIM_SUPPORTED_FEATURES: &[&str] = &["hit-test", "local", "viewer"];

/// Backdrop standing in for the camera feed on native builds
pub const SIM_BACKGROUND_COLOUR: Color = Color::srgb(0.16, 0.17, 0.2);

/// Colour and half-extent of the simulated floor
pub const SIM_FLOOR_COLOUR: Color = Color::srgb(0.3, 0.32, 0.3);
pub const SIM_FLOOR_HALF_SIZE: f32 = 10.0;
