//! # Scene Management Module
//!
//! The retained scene graph: a flat, ordered store of objects and lights plus
//! the background and fog settings that apply to the whole scene.
//!
//! ## Key Components
//!
//! - [`Scene`] - Node store addressed by stable [`NodeId`]s
//! - [`Object`] - Named group of meshes with one transform
//! - [`Light`] - Ambient, directional or point light
//! - [`Vertex3D`] - GPU vertex layout shared by every mesh
//!
//! ## Usage
//!
//! ```no_run
//! use diorama::gfx::geometry::generate_box;
//! use diorama::gfx::resources::material::Material;
//! use diorama::gfx::scene::{Object, Scene};
//!
//! let mut scene = Scene::new();
//! let id = scene.add_object(Object::single(
//!     "box",
//!     generate_box(2.0, 2.0, 2.0),
//!     Material::rgb("red", [1.0, 0.0, 0.0]),
//! ));
//! assert!(scene.object(id).is_some());
//! ```

pub mod light;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use light::{Light, LightKind};
pub use object::{DrawObject, Mesh, MeshFilter, Object, Transform};
pub use scene::{Background, Fog, NodeId, Scene, SceneNode, SceneStatistics};
pub use vertex::Vertex3D;
