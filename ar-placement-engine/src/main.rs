//! Tap-to-place AR viewer.
//!
//! Starts an immersive AR session, tracks a real-world surface through the
//! platform hit-test service, shows a reticle on it and places one animated
//! glTF model where the user taps.

mod engine;
mod placement;
mod xr;

#[cfg(test)]
mod test_support;

use crate::engine::core::app_setup::create_app;

fn main() {
    let mut app = create_app();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}
