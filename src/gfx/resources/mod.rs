//! GPU resource management
//!
//! Handles materials, textures, uniform buffers and bind groups for rendering.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform};
pub use material::{Material, MaterialBindings};
pub use texture_resource::{CubeTexture, SharedTexture, TextureImage, TextureResource};
