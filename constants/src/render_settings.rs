use bevy::color::Color;

/// Vertical field of view of the AR camera before the platform supplies its own projection.
pub const CAMERA_FOV_DEGREES: f32 = 70.0;
pub const CAMERA_NEAR: f32 = 0.01;
pub const CAMERA_FAR: f32 = 20.0;

/// Sky and ground tints of the ambient fill light
pub const SKY_LIGHT_COLOUR: Color = Color::srgb(1.0, 1.0, 1.0);
pub const GROUND_LIGHT_COLOUR: Color = Color::srgb(0.733, 0.733, 1.0);

/// Brightness of the ambient fill (cd/m^2)
pub const AMBIENT_BRIGHTNESS: f32 = 600.0;

/// Illuminance of the key light (lux)
pub const KEY_LIGHT_ILLUMINANCE: f32 = 2_000.0;

/// Default log filter; `RUST_LOG` takes precedence when set
pub const DEFAULT_LOG_FILTER: &str = "wgpu=error,naga=warn,ar_placement_engine=debug";
