//! Pedestal - a skinned glTF character viewer.
//!
//! Browses a fixed catalog of characters and lets the user:
//! - pick a model and one of its animation clips
//! - orbit, pan, and zoom the camera around it
//! - spin it on a turntable, swap lighting presets and theme
//! - save a screenshot of the current view

mod app;
mod assets;
mod render;
mod scene;
mod ui;
mod viewer;

fn main() {
    app::run();
}
