//! # Graphics Module
//!
//! Everything between the scene description and the pixels on screen.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Orbit camera with damped controls
//! - **Geometry** ([`geometry`]) - Primitive generation and vertex data
//! - **Picking** ([`picking`]) - Ray casting from the pointer into the scene
//! - **Rendering Pipeline** ([`rendering`]) - Shadowed forward renderer with fog and skybox
//! - **Resource Management** ([`resources`]) - Materials, textures and bind groups
//! - **Scene Management** ([`scene`]) - Flat scene graph of objects and lights
//!
//! ## Usage
//!
//! ```no_run
//! use diorama::gfx::{scene::Scene, OrbitCamera};
//!
//! let mut scene = Scene::new();
//! let camera = OrbitCamera::from_config(1200.0 / 800.0);
//! // render_engine.render_frame(&mut scene, &camera)?;
//! ```

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::{render_engine::RenderEngine, RenderSurface};
