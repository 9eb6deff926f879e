//! # Object Picking System
//!
//! Finds the object under the pointer by casting a ray from the camera.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: Unproject normalized device coordinates through the camera
//! 2. **Broad phase**: Test the ray against each candidate's world-space bounding box
//! 3. **Narrow phase**: Test the surviving objects triangle by triangle
//! 4. **Selection**: Return the closest hit
//!
//! ## Usage
//!
//! ```no_run
//! use diorama::gfx::{camera::OrbitCamera, picking::ObjectPicker, scene::Scene};
//!
//! # fn pick(camera: &OrbitCamera, scene: &Scene, shapes: &[diorama::gfx::scene::NodeId]) {
//! let mut picker = ObjectPicker::new();
//! let ray = picker.screen_to_ray((0.0, 0.0), camera);
//! if let Some(hit) = picker.pick_nearest(&ray, scene, shapes) {
//!     log::info!("Hit {:?} at distance {}", hit.node, hit.distance);
//! }
//! # }
//! ```

use std::collections::HashMap;

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4, Zero};

use crate::gfx::{
    camera::orbit_camera::OrbitCamera,
    scene::{NodeId, Object, Scene},
};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Möller-Trumbore ray/triangle test, both faces count as hits
    ///
    /// Returns the distance along the ray to the hit point.
    pub fn intersect_triangle(&self, triangle: [Vector3<f32>; 3]) -> Option<f32> {
        const EPSILON: f32 = 1e-7;
        let [a, b, c] = triangle;

        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None; // parallel to the triangle plane
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl AABB {
    /// Create a new AABB
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        let mut min = Vector3::from(*first);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            let v = Vector3::from(*vertex);
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }

        Self::new(min, max)
    }

    /// Bounds of every vertex of every mesh of an object, in object space
    pub fn from_object(object: &Object) -> Option<Self> {
        let vertices: Vec<[f32; 3]> = object
            .meshes
            .iter()
            .flat_map(|mesh| mesh.geometry.vertices.iter().copied())
            .collect();
        (!vertices.is_empty()).then(|| Self::from_vertices(&vertices))
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        // Transform all 8 corners of the AABB and compute new bounds
        let corners: Vec<[f32; 3]> = (0..8)
            .map(|i| {
                let corner = Vector4::new(
                    if i & 1 == 0 { self.min.x } else { self.max.x },
                    if i & 2 == 0 { self.min.y } else { self.max.y },
                    if i & 4 == 0 { self.min.z } else { self.max.z },
                    1.0,
                );
                let p = matrix * corner;
                [p.x / p.w, p.y / p.w, p.z / p.w]
            })
            .collect();

        Self::from_vertices(&corners)
    }
}

/// Result of an object picking operation
#[derive(Debug, Clone, Copy)]
pub struct PickResult {
    /// Picked node
    pub node: NodeId,
    /// Distance from ray origin to intersection point
    pub distance: f32,
    /// World space intersection point
    pub intersection_point: Vector3<f32>,
}

/// Object picker for pointer selection
#[derive(Default)]
pub struct ObjectPicker {
    /// Object-space bounds, keyed by node
    cached_aabbs: HashMap<NodeId, AABB>,
}

impl ObjectPicker {
    /// Create a new object picker
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert normalized device coordinates (x right, y up, both in
    /// [-1, 1]) to a world-space ray through the camera
    pub fn screen_to_ray(&self, ndc: (f32, f32), camera: &OrbitCamera) -> Ray {
        let view_proj = camera.projection_matrix() * camera.view_matrix();
        let inv_view_proj = view_proj.invert().unwrap_or(Matrix4::identity());

        let unproject = |z: f32| {
            let p = inv_view_proj * Vector4::new(ndc.0, ndc.1, z, 1.0);
            Vector3::new(p.x / p.w, p.y / p.w, p.z / p.w)
        };

        // Near and far planes in OpenGL clip space
        let near = unproject(-1.0);
        let far = unproject(1.0);

        Ray::new(near, far - near)
    }

    /// Nearest intersection between `ray` and the `candidates`
    ///
    /// Ids that no longer resolve to a visible object are skipped.
    pub fn pick_nearest(
        &mut self,
        ray: &Ray,
        scene: &Scene,
        candidates: &[NodeId],
    ) -> Option<PickResult> {
        let mut closest: Option<PickResult> = None;

        for &id in candidates {
            let Some(object) = scene.object(id).filter(|o| o.visible) else {
                continue;
            };

            let aabb = match self.cached_aabbs.get(&id) {
                Some(aabb) => *aabb,
                None => {
                    let Some(aabb) = AABB::from_object(object) else {
                        continue;
                    };
                    self.cached_aabbs.insert(id, aabb);
                    aabb
                }
            };

            let model = object.model_matrix();
            let Some(box_distance) = aabb.transform(&model).intersect_ray(ray) else {
                continue;
            };
            if closest.is_some_and(|c| box_distance > c.distance) {
                continue;
            }

            if let Some(distance) = intersect_object(ray, object, &model) {
                if closest.map_or(true, |c| distance < c.distance) {
                    closest = Some(PickResult {
                        node: id,
                        distance,
                        intersection_point: ray.point_at(distance),
                    });
                }
            }
        }

        closest
    }
}

/// Closest triangle hit over all meshes of an object, in world space
fn intersect_object(ray: &Ray, object: &Object, model: &Matrix4<f32>) -> Option<f32> {
    let to_world = |p: [f32; 3]| {
        let v = model * Vector4::new(p[0], p[1], p[2], 1.0);
        Vector3::new(v.x, v.y, v.z)
    };

    object
        .meshes
        .iter()
        .flat_map(|mesh| mesh.geometry.triangles())
        .filter_map(|[a, b, c]| ray.intersect_triangle([to_world(a), to_world(b), to_world(c)]))
        .min_by(|a, b| a.total_cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::{generate_box, generate_sphere},
        resources::material::Material,
    };

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = AABB::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(aabb.center(), Vector3::zero());
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = AABB::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        // Ray hitting the box
        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        // Ray missing the box
        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn test_ray_triangle_intersection() {
        let triangle = [
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];

        let ray = Ray::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let t = ray.intersect_triangle(triangle).unwrap();
        assert!((t - 3.0).abs() < 1e-6);

        // Behind the origin
        let away = Ray::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(away.intersect_triangle(triangle).is_none());

        // Outside the edges
        let beside = Ray::new(Vector3::new(2.0, 2.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(beside.intersect_triangle(triangle).is_none());
    }

    #[test]
    fn test_pick_nearest_prefers_closer_object() {
        let mut scene = Scene::new();
        let far = scene.add_object(
            Object::single("far", generate_box(2.0, 2.0, 2.0), Material::default())
                .with_position(Vector3::new(0.0, 0.0, -10.0)),
        );
        let near = scene.add_object(
            Object::single("near", generate_box(2.0, 2.0, 2.0), Material::default())
                .with_position(Vector3::new(0.0, 0.0, -4.0)),
        );

        let mut picker = ObjectPicker::new();
        let ray = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

        let hit = picker.pick_nearest(&ray, &scene, &[far, near]).unwrap();
        assert_eq!(hit.node, near);
        assert!((hit.distance - 3.0).abs() < 1e-5);

        // Only candidates are considered
        let hit = picker.pick_nearest(&ray, &scene, &[far]).unwrap();
        assert_eq!(hit.node, far);
    }

    #[test]
    fn test_sphere_is_picked_by_surface_not_box() {
        let mut scene = Scene::new();
        let sphere = scene.add_object(Object::single(
            "sphere",
            generate_sphere(1.0, 32, 16),
            Material::default(),
        ));

        let mut picker = ObjectPicker::new();

        // Passes through the bounding box corner but misses the sphere
        let corner = Ray::new(Vector3::new(0.9, 0.9, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(picker.pick_nearest(&corner, &scene, &[sphere]).is_none());

        let center = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = picker.pick_nearest(&center, &scene, &[sphere]).unwrap();
        assert!((hit.distance - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_removed_candidates_are_skipped() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object::single(
            "box",
            generate_box(2.0, 2.0, 2.0),
            Material::default(),
        ));
        scene.remove(id);

        let mut picker = ObjectPicker::new();
        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(picker.pick_nearest(&ray, &scene, &[id]).is_none());
    }

    #[test]
    fn test_center_of_screen_ray_follows_camera_axis() {
        let camera = OrbitCamera::new(
            Vector3::new(0.0, 0.0, 10.0),
            Vector3::zero(),
            1.0,
        );
        let picker = ObjectPicker::new();
        let ray = picker.screen_to_ray((0.0, 0.0), &camera);

        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-4);
        assert!(ray.origin.z < 10.0 && ray.origin.z > 9.0);
    }
}
