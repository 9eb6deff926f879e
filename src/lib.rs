//! Diorama
//!
//! A small 3D showcase scene built on wgpu and winit: lit primitives with
//! shadows, textured cubes, glTF and OBJ models, a skybox, distance fog and
//! mouse picking of the primitives.

pub mod animation;
pub mod app;
pub mod assets;
pub mod config;
pub mod controller;
pub mod error;
pub mod gfx;
pub mod logging;
pub mod scene_builder;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::DioramaApp;
pub use controller::SceneController;
