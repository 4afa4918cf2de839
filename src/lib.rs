// ==================== Imports ====================
use wasm_bindgen::prelude::*;

pub mod browser;
pub mod engine;
pub mod game;
pub mod hero;
pub mod manager;
pub mod obstacle;
pub mod scene;
pub mod sprite;

use crate::engine::GameLoop;
use crate::game::RunnerGame;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs panic hook and console logger
/// - loads the game, then hands it to the game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();
    init_logging();

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        if let Err(err) = GameLoop::start(RunnerGame::new()).await {
            log::error!("Could not start the game : {:#}", err);
        }
    });

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn init_logging() {
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&format!("Logger already set : {}", err).into());
    }
}

// native builds only run tests, which install no logger
#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {}
