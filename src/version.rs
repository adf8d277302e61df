//! Version information about cave-water.

use wasm_bindgen::prelude::*;

/// Gives the cave-water version as a `String`.
#[wasm_bindgen]
pub fn cave_water_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Gives the version of the git repository as a `String`.
#[wasm_bindgen]
pub fn cave_water_git_version() -> String {
    git_version::git_version!(fallback = "unknown").to_string()
}
