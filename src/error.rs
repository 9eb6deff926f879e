//! Error types for asset loading
//!
//! Nothing here is fatal to the application: a failed load is logged and the
//! corresponding element is left out of the scene.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to import glTF {}: {source}", .path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to load material library {}: {source}", .path.display())]
    Mtl {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to load OBJ {}: {source}", .path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("skybox face {face} is {width}x{height}, expected a square {expected}x{expected} image")]
    SkyboxFace {
        face: &'static str,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("{} contains no triangle meshes", .0.display())]
    EmptyModel(PathBuf),

    #[error("loader panicked: {0}")]
    Panicked(String),
}

pub type AssetResult<T> = Result<T, AssetError>;
