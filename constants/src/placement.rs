/// Model placed on the first valid tap, relative to the asset root
pub const MODEL_ASSET_PATH: &str = "models/dino.glb";

/// Uniform scale applied to the placed model
pub const MODEL_SCALE: f32 = 1.0;

/// Runtime settings file, relative to the asset root
pub const SETTINGS_PATH: &str = "config/scene.ar.json";

/// File extension registered for the settings asset loader
pub const SETTINGS_EXTENSION: &str = "ar.json";
