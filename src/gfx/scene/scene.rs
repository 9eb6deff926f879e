use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::gfx::resources::texture_resource::CubeTexture;

use super::{light::Light, object::Object};

/// Stable handle to a node in a [`Scene`]
///
/// Ids are never reused, so a stale id simply stops resolving once its node
/// is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

pub enum SceneNode {
    Object(Object),
    Light(Light),
}

/// What is drawn behind all geometry
#[derive(Debug, Clone)]
pub enum Background {
    Color([f32; 3]),
    Cubemap(Arc<CubeTexture>),
}

/// Exponential-squared distance fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub density: f32,
}

impl Fog {
    pub fn exp2(color: [f32; 3], density: f32) -> Self {
        Self { color, density }
    }

    /// Fraction of fog color mixed in at `distance`
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStatistics {
    pub objects: usize,
    pub lights: usize,
    pub meshes: usize,
    pub triangles: usize,
}

impl fmt::Display for SceneStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} objects, {} lights, {} meshes, {} triangles",
            self.objects, self.lights, self.meshes, self.triangles
        )
    }
}

/// Flat, insertion-ordered store of everything eligible for drawing
#[derive(Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
    pub background: Option<Background>,
    pub fog: Option<Fog>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    pub fn add_object(&mut self, object: Object) -> NodeId {
        self.insert(SceneNode::Object(object))
    }

    pub fn add_light(&mut self, light: Light) -> NodeId {
        self.insert(SceneNode::Light(light))
    }

    /// Removes a node, releasing its GPU resources
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let mut node = self.nodes.remove(&id)?;
        if let SceneNode::Object(object) = &mut node {
            object.release_gpu_resources();
        }
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn object(&self, id: NodeId) -> Option<&Object> {
        match self.nodes.get(&id)? {
            SceneNode::Object(object) => Some(object),
            SceneNode::Light(_) => None,
        }
    }

    pub fn object_mut(&mut self, id: NodeId) -> Option<&mut Object> {
        match self.nodes.get_mut(&id)? {
            SceneNode::Object(object) => Some(object),
            SceneNode::Light(_) => None,
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = (NodeId, &Object)> {
        self.nodes.iter().filter_map(|(id, node)| match node {
            SceneNode::Object(object) => Some((*id, object)),
            SceneNode::Light(_) => None,
        })
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Object)> {
        self.nodes.iter_mut().filter_map(|(id, node)| match node {
            SceneNode::Object(object) => Some((*id, object)),
            SceneNode::Light(_) => None,
        })
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.nodes.values().filter_map(|node| match node {
            SceneNode::Light(light) => Some(light),
            SceneNode::Object(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes every node and releases its geometry, material and GPU
    /// resources. Background and fog are left as they are.
    ///
    /// Returns the number of nodes removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.nodes.len();
        for node in self.nodes.values_mut() {
            if let SceneNode::Object(object) = node {
                object.release_gpu_resources();
            }
        }
        self.nodes.clear();
        log::debug!("Scene cleared, {} nodes released", removed);
        removed
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = Some(background);
    }

    pub fn set_fog(&mut self, fog: Fog) {
        self.fog = Some(fog);
    }

    pub fn statistics(&self) -> SceneStatistics {
        let mut stats = SceneStatistics::default();
        for node in self.nodes.values() {
            match node {
                SceneNode::Object(object) => {
                    stats.objects += 1;
                    stats.meshes += object.meshes.len();
                    stats.triangles += object.triangle_count();
                }
                SceneNode::Light(_) => stats.lights += 1,
            }
        }
        stats
    }

    /// Meshes currently holding GPU buffers, across all objects
    pub fn gpu_resource_count(&self) -> usize {
        self.objects().map(|(_, o)| o.gpu_resource_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gfx::{
        geometry::{generate_cube, generate_sphere},
        resources::{material::Material, texture_resource::SharedTexture},
    };

    fn cube(name: &str) -> Object {
        Object::single(name, generate_cube(), Material::default())
    }

    #[test]
    fn test_nodes_keep_insertion_order() {
        let mut scene = Scene::new();
        scene.add_light(Light::ambient([1.0; 3], 1.0));
        scene.add_object(cube("first"));
        scene.add_object(cube("second"));

        let names: Vec<_> = scene.objects().map(|(_, o)| o.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
        assert_eq!(scene.lights().count(), 1);
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn test_removed_ids_stop_resolving() {
        let mut scene = Scene::new();
        let a = scene.add_object(cube("a"));
        let b = scene.add_object(cube("b"));

        assert!(scene.remove(a).is_some());
        assert!(scene.object(a).is_none());
        assert!(scene.remove(a).is_none());
        assert_eq!(scene.object(b).map(|o| o.name.as_str()), Some("b"));

        // Fresh ids never collide with removed ones
        let c = scene.add_object(cube("c"));
        assert_ne!(a, c);
    }

    #[test]
    fn test_light_ids_do_not_resolve_as_objects() {
        let mut scene = Scene::new();
        let light = scene.add_light(Light::ambient([1.0; 3], 1.0));
        assert!(scene.contains(light));
        assert!(scene.object(light).is_none());
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut scene = Scene::new();
        let brick = SharedTexture::new("brick");
        let weak = Arc::downgrade(&brick);

        scene.add_object(Object::single(
            "brick cube",
            generate_cube(),
            Material::default().with_map(brick),
        ));
        scene.add_object(cube("plain"));
        scene.add_light(Light::ambient([1.0; 3], 1.0));
        scene.set_fog(Fog::exp2([0.8; 3], 0.01));

        assert_eq!(scene.clear(), 3);
        assert!(scene.is_empty());
        assert_eq!(scene.gpu_resource_count(), 0);
        assert!(weak.upgrade().is_none(), "texture handle still retained");
        assert!(scene.fog.is_some());
    }

    #[test]
    fn test_statistics() {
        let mut scene = Scene::new();
        scene.add_object(cube("cube"));
        scene.add_object(Object::single(
            "sphere",
            generate_sphere(1.0, 8, 4),
            Material::default(),
        ));
        scene.add_light(Light::ambient([1.0; 3], 1.0));

        let stats = scene.statistics();
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.lights, 1);
        assert_eq!(stats.meshes, 2);
        assert_eq!(stats.triangles, 12 + 8 * 4 * 2);
    }

    #[test]
    fn test_fog_factor() {
        let fog = Fog::exp2([0.8; 3], 0.01);
        assert_eq!(fog.factor(0.0), 0.0);
        let expected = 1.0 - (-1.0f32).exp();
        assert!((fog.factor(100.0) - expected).abs() < 1e-6);
        assert!(fog.factor(1.0e4) <= 1.0);
    }
}
