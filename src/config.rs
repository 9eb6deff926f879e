//! Scene configuration
//!
//! Every fixed value of the showcase scene lives here, together with the
//! asset locations. Only the asset root and the layout seed can be changed at
//! runtime, through `DIORAMA_ASSET_DIR` and `DIORAMA_SEED`.

use std::path::{Path, PathBuf};

use cgmath::Vector3;

const fn vec3(x: f32, y: f32, z: f32) -> Vector3<f32> {
    Vector3 { x, y, z }
}

// Camera
pub const CAMERA_FOV_DEGREES: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_POSITION: Vector3<f32> = vec3(0.0, 10.0, 30.0);
pub const CAMERA_TARGET: Vector3<f32> = vec3(0.0, 0.0, 0.0);

// Orbit controls
pub const ORBIT_DAMPING_FACTOR: f32 = 0.05;
pub const ORBIT_MIN_POLAR_ANGLE: f32 = 0.0;
pub const ORBIT_MAX_POLAR_ANGLE: f32 = std::f32::consts::FRAC_PI_2;
pub const ORBIT_MIN_DISTANCE: f32 = 2.0;
pub const ORBIT_MAX_DISTANCE: f32 = 200.0;

// Lights
pub const AMBIENT_COLOR: [f32; 3] = [0.25, 0.25, 0.25];
pub const AMBIENT_INTENSITY: f32 = 1.0;
pub const DIRECTIONAL_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const DIRECTIONAL_INTENSITY: f32 = 1.0;
pub const DIRECTIONAL_POSITION: Vector3<f32> = vec3(10.0, 20.0, 10.0);
pub const POINT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const POINT_INTENSITY: f32 = 1.0;
pub const POINT_RANGE: f32 = 100.0;
pub const POINT_POSITION: Vector3<f32> = vec3(0.0, 15.0, 0.0);

// Ground
pub const GROUND_SIZE: f32 = 100.0;
pub const GROUND_COLOR: [f32; 3] = [0.5, 0.5, 0.5];

// Random primitives
pub const SHAPE_COUNT: usize = 20;
pub const BOX_THRESHOLD: f32 = 0.33;
pub const SPHERE_THRESHOLD: f32 = 0.66;
pub const BOX_SIZE: f32 = 2.0;
pub const SPHERE_RADIUS: f32 = 1.0;
pub const CYLINDER_RADIUS: f32 = 1.0;
pub const CYLINDER_HEIGHT: f32 = 2.0;
pub const SHAPE_SPREAD: f32 = 50.0;
pub const SHAPE_MIN_HEIGHT: f32 = 2.0;
pub const SHAPE_HEIGHT_RANGE: f32 = 10.0;
pub const SHAPE_SEGMENTS: u32 = 32;

// Picking
pub const HIGHLIGHT_COLOR: [f32; 3] = [1.0, 0.0, 0.0];
pub const NO_EMISSION: [f32; 3] = [0.0, 0.0, 0.0];

// Textured cubes
pub const BRICK_CUBES: [(Vector3<f32>, f32); 2] = [
    (vec3(-8.0, 1.5, 8.0), 3.0),
    (vec3(8.0, 1.0, 8.0), 2.0),
];

// Animated sphere
pub const ANIMATED_SPHERE_COLOR: [f32; 3] = [0.0, 1.0, 0.0];
pub const ANIMATED_SPHERE_POSITION: Vector3<f32> = vec3(0.0, 2.0, 5.0);
pub const ANIMATED_SPHERE_RADIUS: f32 = 1.0;
pub const SPHERE_BASELINE: f32 = 2.0;
pub const SPHERE_AMPLITUDE: f32 = 2.0;
/// Angular frequency in radians per millisecond
pub const SPHERE_FREQUENCY: f64 = 0.001;

// Loaded models
pub const CRATE_POSITION: Vector3<f32> = vec3(-10.0, 0.0, -10.0);
pub const CRATE_SCALE: f32 = 2.0;
pub const BIRD_POSITION: Vector3<f32> = vec3(10.0, 5.0, -10.0);
pub const BIRD_ROTATION: Vector3<f32> = vec3(0.0, std::f32::consts::FRAC_PI_4, 0.0);
pub const BIRD_SCALE: f32 = 0.5;
pub const BIRD_FALLBACK_COLOR: [f32; 3] = [0.0, 1.0, 0.0];

// Fog
pub const FOG_COLOR: [f32; 3] = [0.8, 0.8, 0.8];
pub const FOG_DENSITY: f32 = 0.01;

/// Solid background used until (or instead of) the skybox
pub const FALLBACK_BACKGROUND: [f32; 3] = FOG_COLOR;

/// Cube faces in wgpu layer order: +X, -X, +Y, -Y, +Z, -Z
pub const SKYBOX_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// Locations of every external asset, relative to one root directory
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub root: PathBuf,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Self {
        let root = std::env::var_os("DIORAMA_ASSET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assets"));
        Self::new(root)
    }

    pub fn skybox_faces(&self) -> [PathBuf; 6] {
        SKYBOX_FACES.map(|face| self.resolve(format!("textures/skybox/{face}.jpg")))
    }

    pub fn brick_texture(&self) -> PathBuf {
        self.resolve("textures/brick.jpg")
    }

    pub fn crate_model(&self) -> PathBuf {
        self.resolve("models/crate.glb")
    }

    pub fn bird_model(&self) -> PathBuf {
        self.resolve("models/bird.obj")
    }

    pub fn bird_materials(&self) -> PathBuf {
        self.resolve("models/bird.mtl")
    }

    fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::new("assets")
    }
}

/// Runtime configuration for building the scene
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub assets: AssetPaths,
    pub shape_count: usize,
    /// Fixed seed for the primitive layout; random when `None`
    pub seed: Option<u64>,
}

impl SceneConfig {
    pub fn from_env() -> Self {
        let seed = std::env::var("DIORAMA_SEED").ok().and_then(|raw| {
            raw.parse()
                .map_err(|err| log::warn!("Ignoring DIORAMA_SEED={raw:?}: {err}"))
                .ok()
        });

        Self {
            assets: AssetPaths::from_env(),
            shape_count: SHAPE_COUNT,
            seed,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            shape_count: SHAPE_COUNT,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_paths_resolve_under_root() {
        let paths = AssetPaths::new("/data/scene");
        assert_eq!(paths.crate_model(), PathBuf::from("/data/scene/models/crate.glb"));
        assert_eq!(paths.bird_materials(), PathBuf::from("/data/scene/models/bird.mtl"));

        let faces = paths.skybox_faces();
        assert_eq!(faces[0], PathBuf::from("/data/scene/textures/skybox/px.jpg"));
        assert_eq!(faces[5], PathBuf::from("/data/scene/textures/skybox/nz.jpg"));
    }

    #[test]
    fn test_default_config_builds_twenty_shapes() {
        let config = SceneConfig::default();
        assert_eq!(config.shape_count, 20);
        assert!(config.seed.is_none());
    }
}
