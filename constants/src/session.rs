/// Features the platform must grant or the session request fails
pub const REQUIRED_FEATURES: &[&str] = &["hit-test"];

/// DOM id of the element that starts an AR session (web builds)
pub const START_BUTTON_ID: &str = "arButton";

/// Canvas the engine renders into (web builds)
pub const CANVAS_SELECTOR: &str = "#bevy";
