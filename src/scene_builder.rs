//! Builds the showcase scene
//!
//! Everything that can be created immediately (lights, ground, primitives,
//! textured cubes, the animated sphere, fog) is added by [`populate`]. The
//! skybox, brick texture and both models are handed to the [`AssetLoader`]
//! by [`start_loads`] and arrive later as [`LoadEvent`](crate::assets::LoadEvent)s.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use cgmath::Vector3;
use rand::Rng;

use crate::assets::{
    gltf_model, obj_model, texture, AssetKind, AssetLoader, LoadedAsset,
};
use crate::config::{self, AssetPaths};
use crate::gfx::geometry::{
    generate_box, generate_cylinder, generate_plane, generate_sphere, GeometryData,
};
use crate::gfx::resources::{Material, SharedTexture};
use crate::gfx::scene::{Fog, Light, NodeId, Object, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Box,
    Sphere,
    Cylinder,
}

impl ShapeKind {
    /// Maps a uniform roll in [0, 1) onto a kind
    pub fn from_roll(roll: f32) -> Self {
        if roll < config::BOX_THRESHOLD {
            ShapeKind::Box
        } else if roll < config::SPHERE_THRESHOLD {
            ShapeKind::Sphere
        } else {
            ShapeKind::Cylinder
        }
    }

    pub fn geometry(self) -> GeometryData {
        match self {
            ShapeKind::Box => generate_box(config::BOX_SIZE, config::BOX_SIZE, config::BOX_SIZE),
            ShapeKind::Sphere => generate_sphere(
                config::SPHERE_RADIUS,
                config::SHAPE_SEGMENTS,
                config::SHAPE_SEGMENTS,
            ),
            ShapeKind::Cylinder => generate_cylinder(
                config::CYLINDER_RADIUS,
                config::CYLINDER_RADIUS,
                config::CYLINDER_HEIGHT,
                config::SHAPE_SEGMENTS,
            ),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ShapeKind::Box => "box",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cylinder => "cylinder",
        }
    }
}

/// Randomised description of one primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSpec {
    pub kind: ShapeKind,
    pub color: [f32; 3],
    pub position: Vector3<f32>,
}

impl ShapeSpec {
    pub fn build(&self, index: usize) -> Object {
        let name = format!("{}_{index}", self.kind.name());
        Object::single(
            name.clone(),
            self.kind.geometry(),
            Material::rgb(&name, self.color),
        )
        .with_position(self.position)
        .with_shadows(true, true)
    }
}

pub fn generate_shapes<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ShapeSpec> {
    (0..count)
        .map(|_| {
            let kind = ShapeKind::from_roll(rng.random::<f32>());
            let color = [rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>()];
            let position = Vector3::new(
                (rng.random::<f32>() - 0.5) * config::SHAPE_SPREAD,
                rng.random::<f32>() * config::SHAPE_HEIGHT_RANGE + config::SHAPE_MIN_HEIGHT,
                (rng.random::<f32>() - 0.5) * config::SHAPE_SPREAD,
            );
            ShapeSpec {
                kind,
                color,
                position,
            }
        })
        .collect()
}

/// Nodes and shared resources the controller keeps track of
pub struct SceneHandles {
    /// The random primitives, the only pickable nodes
    pub shapes: Vec<NodeId>,
    pub animated_sphere: NodeId,
    /// Filled when the brick texture load finishes
    pub brick_texture: Arc<SharedTexture>,
}

/// Clears `scene` and adds everything that needs no external asset
pub fn populate<R: Rng + ?Sized>(scene: &mut Scene, shape_count: usize, rng: &mut R) -> SceneHandles {
    scene.clear();

    scene.add_light(Light::ambient(config::AMBIENT_COLOR, config::AMBIENT_INTENSITY));
    scene.add_light(
        Light::directional(
            config::DIRECTIONAL_COLOR,
            config::DIRECTIONAL_INTENSITY,
            config::DIRECTIONAL_POSITION,
        )
        .with_shadows(),
    );
    scene.add_light(
        Light::point(
            config::POINT_COLOR,
            config::POINT_INTENSITY,
            config::POINT_RANGE,
            config::POINT_POSITION,
        )
        .with_shadows(),
    );

    scene.add_object(ground());

    let shapes: Vec<NodeId> = generate_shapes(rng, shape_count)
        .iter()
        .enumerate()
        .map(|(index, shape)| scene.add_object(shape.build(index)))
        .collect();

    let brick_texture = SharedTexture::new("brick");
    for (index, (position, size)) in config::BRICK_CUBES.into_iter().enumerate() {
        let material = Material::rgb("brick", [1.0, 1.0, 1.0]).with_map(brick_texture.clone());
        let cube = Object::single(
            format!("brick_cube_{index}"),
            generate_box(size, size, size),
            material,
        )
        .with_position(position)
        .with_shadows(true, false);
        scene.add_object(cube);
    }

    let animated_sphere = scene.add_object(
        Object::single(
            "animated_sphere",
            generate_sphere(
                config::ANIMATED_SPHERE_RADIUS,
                config::SHAPE_SEGMENTS,
                config::SHAPE_SEGMENTS,
            ),
            Material::rgb("animated_sphere", config::ANIMATED_SPHERE_COLOR),
        )
        .with_position(config::ANIMATED_SPHERE_POSITION)
        .with_shadows(true, false),
    );

    scene.set_fog(Fog::exp2(config::FOG_COLOR, config::FOG_DENSITY));

    log::info!("Scene populated: {}", scene.statistics());

    SceneHandles {
        shapes,
        animated_sphere,
        brick_texture,
    }
}

fn ground() -> Object {
    let material = Material::rgb("ground", config::GROUND_COLOR).with_double_sided();
    Object::single(
        "ground",
        generate_plane(config::GROUND_SIZE, config::GROUND_SIZE, 1, 1),
        material,
    )
    .with_rotation(Vector3::new(-FRAC_PI_2, 0.0, 0.0))
    .with_shadows(false, true)
}

/// Hands the four external assets to the loader
pub fn start_loads(loader: &mut AssetLoader, assets: &AssetPaths) {
    let faces = assets.skybox_faces();
    loader.spawn(AssetKind::Skybox, move |progress| async move {
        let cube = texture::load_cubemap(&faces, |loaded| progress.report(loaded, Some(6)))?;
        Ok(LoadedAsset::Skybox(cube))
    });

    let brick = assets.brick_texture();
    loader.spawn(AssetKind::BrickTexture, move |_| async move {
        texture::load_texture_image(&brick).map(LoadedAsset::Texture)
    });

    let crate_model = assets.crate_model();
    loader.spawn(AssetKind::CrateModel, move |progress| async move {
        let object = gltf_model::load_gltf_model(&crate_model)?;
        progress.report(object.meshes.len(), Some(object.meshes.len()));
        Ok(LoadedAsset::Model(place_crate(object)))
    });

    let bird_mtl = assets.bird_materials();
    let bird_obj = assets.bird_model();
    loader.spawn(AssetKind::BirdModel, move |progress| async move {
        let library = obj_model::load_materials(&bird_mtl)?;
        progress.report(1, Some(2));
        let object = obj_model::load_obj_model(&bird_obj, &library, config::BIRD_FALLBACK_COLOR)?;
        progress.report(2, Some(2));
        Ok(LoadedAsset::Model(place_bird(object)))
    });
}

pub fn place_crate(object: Object) -> Object {
    object
        .with_position(config::CRATE_POSITION)
        .with_uniform_scale(config::CRATE_SCALE)
        .with_shadows(true, true)
}

pub fn place_bird(mut object: Object) -> Object {
    center_vertically(&mut object);
    object
        .with_position(config::BIRD_POSITION)
        .with_rotation(config::BIRD_ROTATION)
        .with_uniform_scale(config::BIRD_SCALE)
        .with_shadows(true, true)
}

/// Moves the geometry so its bounding box is centred on y = 0
fn center_vertically(object: &mut Object) {
    let bounds = object
        .meshes
        .iter()
        .filter_map(|mesh| mesh.geometry.bounds())
        .reduce(|(min_a, max_a), (min_b, max_b)| {
            (
                [min_a[0].min(min_b[0]), min_a[1].min(min_b[1]), min_a[2].min(min_b[2])],
                [max_a[0].max(max_b[0]), max_a[1].max(max_b[1]), max_a[2].max(max_b[2])],
            )
        });

    if let Some((min, max)) = bounds {
        let offset = Vector3::new(0.0, -(min[1] + max[1]) * 0.5, 0.0);
        for mesh in &mut object.meshes {
            mesh.geometry.translate(offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::Mesh;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shape_kind_thresholds() {
        assert_eq!(ShapeKind::from_roll(0.0), ShapeKind::Box);
        assert_eq!(ShapeKind::from_roll(0.329), ShapeKind::Box);
        assert_eq!(ShapeKind::from_roll(0.33), ShapeKind::Sphere);
        assert_eq!(ShapeKind::from_roll(0.659), ShapeKind::Sphere);
        assert_eq!(ShapeKind::from_roll(0.66), ShapeKind::Cylinder);
        assert_eq!(ShapeKind::from_roll(0.999), ShapeKind::Cylinder);
    }

    #[test]
    fn test_generated_shapes_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let shapes = generate_shapes(&mut rng, 500);
        assert_eq!(shapes.len(), 500);

        for shape in &shapes {
            assert!((-25.0..=25.0).contains(&shape.position.x));
            assert!((2.0..=12.0).contains(&shape.position.y));
            assert!((-25.0..=25.0).contains(&shape.position.z));
            assert!(shape.color.iter().all(|c| (0.0..=1.0).contains(c)));
        }

        // 500 rolls hit every kind
        for kind in [ShapeKind::Box, ShapeKind::Sphere, ShapeKind::Cylinder] {
            assert!(shapes.iter().any(|s| s.kind == kind));
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = generate_shapes(&mut StdRng::seed_from_u64(42), 20);
        let b = generate_shapes(&mut StdRng::seed_from_u64(42), 20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_populate_builds_full_scene() {
        let mut scene = Scene::new();
        let handles = populate(&mut scene, 20, &mut StdRng::seed_from_u64(1));

        assert_eq!(handles.shapes.len(), 20);
        assert!(!handles.brick_texture.is_ready());

        let stats = scene.statistics();
        assert_eq!(stats.lights, 3);
        // ground + shapes + two brick cubes + animated sphere
        assert_eq!(stats.objects, 24);
        assert!(scene.fog.is_some());
        assert!(scene.background.is_none());

        for id in &handles.shapes {
            let shape = scene.object(*id).unwrap();
            assert!(shape.meshes.iter().all(|m| m.cast_shadow && m.receive_shadow));
            assert_eq!(shape.emissive(), [0.0; 3]);
        }

        let sphere = scene.object(handles.animated_sphere).unwrap();
        assert_eq!(sphere.transform.position, config::ANIMATED_SPHERE_POSITION);
    }

    #[test]
    fn test_populate_twice_replaces_scene() {
        let mut scene = Scene::new();
        let first = populate(&mut scene, 20, &mut StdRng::seed_from_u64(1));
        let second = populate(&mut scene, 20, &mut StdRng::seed_from_u64(2));

        assert_eq!(scene.statistics().objects, 24);
        assert!(first.shapes.iter().all(|id| !scene.contains(*id)));
        assert!(second.shapes.iter().all(|id| scene.contains(*id)));
    }

    #[test]
    fn test_ground_is_horizontal_and_double_sided() {
        let ground = ground();
        let normal = ground.model_matrix() * cgmath::Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!((normal.y - 1.0).abs() < 1e-5);
        assert!(ground.meshes[0].material.double_sided);
        assert!(ground.meshes[0].receive_shadow);
    }

    #[test]
    fn test_bird_is_centred_and_placed() {
        let mut geometry = generate_box(1.0, 4.0, 1.0);
        geometry.translate(Vector3::new(0.0, 10.0, 0.0));
        let bird = place_bird(Object::new(
            "bird",
            vec![Mesh::new("body", geometry, Material::default())],
        ));

        let (min, max) = bird.meshes[0].geometry.bounds().unwrap();
        assert!((min[1] + 2.0).abs() < 1e-5);
        assert!((max[1] - 2.0).abs() < 1e-5);
        assert_eq!(bird.transform.position, config::BIRD_POSITION);
        assert_eq!(bird.transform.scale, Vector3::new(0.5, 0.5, 0.5));
        assert!(bird.meshes[0].cast_shadow && bird.meshes[0].receive_shadow);
    }
}
