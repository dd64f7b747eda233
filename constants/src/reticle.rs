use bevy::color::Color;

/// Inner radius of the placement ring (metres)
pub const RETICLE_INNER_RADIUS: f32 = 0.08;

/// Outer radius of the placement ring (metres)
pub const RETICLE_OUTER_RADIUS: f32 = 0.1;

/// Number of segments used to tessellate the ring
pub const RETICLE_SEGMENTS: u32 = 32;

pub const RETICLE_COLOUR: Color = Color::srgb(0.0, 1.0, 0.0);
