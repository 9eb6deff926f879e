//! # Procedural Geometry Generation
//!
//! This module provides functions to generate the primitive shapes used by the
//! scene, plus the small amount of CPU-side processing loaded models need
//! (baking transforms, recentring, computing missing normals).
//!
//! ## Supported Primitives
//!
//! - **Box**: axis aligned box with independent width, height and depth
//! - **Sphere**: UV sphere with configurable radius and resolution
//! - **Cylinder**: Y-axis cylinder with top and bottom caps
//! - **Plane**: flat plane in the XY plane facing +Z
//!
//! All primitives are Y-up with counter-clockwise front faces.
//!
//! ## Usage
//!
//! ```rust
//! use diorama::gfx::geometry::{generate_box, generate_sphere, generate_plane};
//!
//! let crate_box = generate_box(2.0, 2.0, 2.0);
//! let sphere = generate_sphere(1.0, 32, 16);
//! let ground = generate_plane(100.0, 100.0, 1, 1);
//! assert_eq!(ground.triangle_count(), 2);
//! ```

pub mod primitives;

pub use primitives::*;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates triangles as vertex position triples
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Interleaves the attribute arrays into the renderer's vertex format
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }

    /// Moves every vertex by `offset`
    pub fn translate(&mut self, offset: Vector3<f32>) {
        for v in &mut self.vertices {
            v[0] += offset.x;
            v[1] += offset.y;
            v[2] += offset.z;
        }
    }

    /// Bakes an affine transform into positions and normals
    pub fn apply_matrix(&mut self, matrix: &Matrix4<f32>) {
        for v in &mut self.vertices {
            let p = matrix * Vector4::new(v[0], v[1], v[2], 1.0);
            *v = [p.x, p.y, p.z];
        }

        let linear = Matrix3::from_cols(
            matrix.x.truncate(),
            matrix.y.truncate(),
            matrix.z.truncate(),
        );
        let normal_matrix = linear
            .invert()
            .map(|inv| inv.transpose())
            .unwrap_or(linear);

        for n in &mut self.normals {
            let transformed = normal_matrix * Vector3::new(n[0], n[1], n[2]);
            if transformed.magnitude2() > 0.0 {
                *n = transformed.normalize().into();
            }
        }
    }

    /// Replaces normals with area-weighted vertex normals
    ///
    /// Used for loaded meshes that ship without normals.
    pub fn compute_normals(&mut self) {
        let mut accum = vec![Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let v0 = Vector3::from(self.vertices[a]);
            let v1 = Vector3::from(self.vertices[b]);
            let v2 = Vector3::from(self.vertices[c]);

            // Cross product length is twice the triangle area
            let face_normal = (v1 - v0).cross(v2 - v0);
            accum[a] += face_normal;
            accum[b] += face_normal;
            accum[c] += face_normal;
        }

        self.normals = accum
            .into_iter()
            .map(|n| {
                if n.magnitude2() > 0.0 {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();
    }

    /// Minimum and maximum corner of the vertex positions
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().skip(1).fold((first, first), |(mut min, mut max), v| {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
            (min, max)
        }))
    }
}

impl Default for GeometryData {
    fn default() -> Self {
        Self::new()
    }
}
