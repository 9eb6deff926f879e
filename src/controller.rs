//! Top-level scene state
//!
//! [`SceneController`] owns the scene store, the camera, the picking
//! selection and the asset loader. All of it is mutated from the event
//! thread only: pointer moves, resizes, loader completions and frames are
//! handled one at a time by the application loop.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::animation;
use crate::assets::{AssetKind, AssetLoader, LoadEvent, LoadedAsset};
use crate::config::{self, SceneConfig};
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::picking::ObjectPicker;
use crate::gfx::scene::{Background, NodeId, Scene};
use crate::gfx::{RenderEngine, RenderSurface};
use crate::scene_builder::{self, SceneHandles};

/// Maps a pointer position in physical pixels to normalized device
/// coordinates, x right and y up in [-1, 1]
pub fn normalized_pointer(position: (f64, f64), size: (u32, u32)) -> (f32, f32) {
    let width = size.0.max(1) as f64;
    let height = size.1.max(1) as f64;
    let x = position.0 / width * 2.0 - 1.0;
    let y = -(position.1 / height * 2.0 - 1.0);
    (x as f32, y as f32)
}

pub struct SceneController {
    scene: Scene,
    camera_manager: CameraManager,
    handles: SceneHandles,
    /// Highlighted shape; a handle into the scene, never ownership
    selection: Option<NodeId>,
    picker: ObjectPicker,
    loader: AssetLoader,
    config: SceneConfig,
}

impl SceneController {
    /// Builds the synchronous part of the scene
    ///
    /// External assets are not requested until [`start_loading`](Self::start_loading).
    pub fn new(config: SceneConfig, aspect: f32) -> std::io::Result<Self> {
        let loader = AssetLoader::new()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut scene = Scene::new();
        let handles = scene_builder::populate(&mut scene, config.shape_count, &mut rng);

        let camera_manager =
            CameraManager::new(OrbitCamera::from_config(aspect), CameraController::default());

        Ok(Self {
            scene,
            camera_manager,
            handles,
            selection: None,
            picker: ObjectPicker::new(),
            loader,
            config,
        })
    }

    pub fn start_loading(&mut self) {
        scene_builder::start_loads(&mut self.loader, &self.config.assets);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera_manager.camera
    }

    pub fn camera_manager_mut(&mut self) -> &mut CameraManager {
        &mut self.camera_manager
    }

    pub fn shapes(&self) -> &[NodeId] {
        &self.handles.shapes
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    /// Loads still in flight
    pub fn pending_loads(&self) -> usize {
        self.loader.pending()
    }

    /// Picks the shape under the pointer and updates the highlight
    ///
    /// Returns `true` if the selection changed.
    pub fn pointer_moved(&mut self, ndc: (f32, f32)) -> bool {
        let ray = self.picker.screen_to_ray(ndc, &self.camera_manager.camera);
        let hit = self
            .picker
            .pick_nearest(&ray, &self.scene, &self.handles.shapes)
            .map(|result| result.node);
        self.apply_selection(hit)
    }

    /// Moves the highlight to `hit`, or clears it for `None`
    ///
    /// Selecting the current selection again changes nothing.
    pub fn apply_selection(&mut self, hit: Option<NodeId>) -> bool {
        if hit == self.selection {
            return false;
        }

        if let Some(previous) = self.selection.take() {
            if let Some(object) = self.scene.object_mut(previous) {
                object.set_emissive(config::NO_EMISSION);
            }
        }

        if let Some(id) = hit {
            if let Some(object) = self.scene.object_mut(id) {
                object.set_emissive(config::HIGHLIGHT_COLOR);
                self.selection = Some(id);
                log::debug!("Selected {}", object.name);
            }
        }

        true
    }

    /// Applies every finished load to the scene
    ///
    /// Returns the number of events handled.
    pub fn apply_load_events(&mut self) -> usize {
        let events = self.loader.poll_events();
        let count = events.len();
        for event in events {
            self.apply_load_event(event);
        }
        count
    }

    fn apply_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Started(kind) => log::debug!("Started loading {kind}"),
            LoadEvent::Progress { .. } => {}
            LoadEvent::Finished(kind, asset) => {
                match asset {
                    LoadedAsset::Skybox(cube) => {
                        self.scene
                            .set_background(Background::Cubemap(Arc::new(cube)));
                    }
                    LoadedAsset::Texture(image) => {
                        self.handles.brick_texture.fill(image);
                    }
                    LoadedAsset::Model(object) => {
                        self.scene.add_object(object);
                    }
                }
                log::info!("Loaded {kind}; scene now has {}", self.scene.statistics());
            }
            LoadEvent::Failed(kind, err) => {
                log::error!("Failed to load {kind}: {err}");
                if kind == AssetKind::Skybox {
                    self.scene
                        .set_background(Background::Color(config::FALLBACK_BACKGROUND));
                }
            }
        }
    }

    /// Per-frame update: sphere animation, then one orbit damping step
    pub fn frame(&mut self, now_ms: f64) {
        if let Some(sphere) = self.scene.object_mut(self.handles.animated_sphere) {
            let mut position = sphere.transform.position;
            position.y = animation::sphere_height(now_ms);
            sphere.set_position(position);
        }

        self.camera_manager.update();
    }

    pub fn render(&mut self, engine: &mut RenderEngine) -> Result<(), wgpu::SurfaceError> {
        engine.render_frame(&mut self.scene, &self.camera_manager.camera)
    }

    /// Matches the camera aspect and the output surface to the new size
    ///
    /// A zero-sized window (minimized) leaves both untouched.
    pub fn resize(&mut self, surface: &mut impl RenderSurface, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera_manager.resize(width, height);
        surface.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::TextureImage;
    use crate::gfx::scene::Object;
    use cgmath::Vector3;

    struct FakeSurface {
        size: (u32, u32),
    }

    impl RenderSurface for FakeSurface {
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }
    }

    fn controller() -> SceneController {
        let config = SceneConfig {
            seed: Some(11),
            ..SceneConfig::default()
        };
        SceneController::new(config, 1.5).unwrap()
    }

    fn highlighted(controller: &SceneController) -> Vec<NodeId> {
        controller
            .shapes()
            .iter()
            .copied()
            .filter(|id| {
                controller
                    .scene()
                    .object(*id)
                    .is_some_and(|o| o.emissive() != config::NO_EMISSION)
            })
            .collect()
    }

    fn aim_at(controller: &mut SceneController, target: Vector3<f32>) {
        let camera = &mut controller.camera_manager_mut().camera;
        camera.target = target;
        camera.eye = target + Vector3::new(0.0, 0.0, 6.0);
    }

    #[test]
    fn test_normalized_pointer() {
        assert_eq!(normalized_pointer((0.0, 0.0), (1200, 800)), (-1.0, 1.0));
        assert_eq!(normalized_pointer((600.0, 400.0), (1200, 800)), (0.0, 0.0));
        assert_eq!(normalized_pointer((1200.0, 800.0), (1200, 800)), (1.0, -1.0));
    }

    #[test]
    fn test_selection_moves_highlight() {
        let mut controller = controller();
        let first = controller.shapes()[0];
        let second = controller.shapes()[1];

        assert!(controller.apply_selection(Some(first)));
        assert_eq!(highlighted(&controller), vec![first]);

        assert!(controller.apply_selection(Some(second)));
        assert_eq!(highlighted(&controller), vec![second]);
        assert_eq!(controller.selection(), Some(second));

        assert!(controller.apply_selection(None));
        assert!(highlighted(&controller).is_empty());
        assert_eq!(controller.selection(), None);
    }

    #[test]
    fn test_repeated_selection_is_idempotent() {
        let mut controller = controller();
        let shape = controller.shapes()[3];

        assert!(controller.apply_selection(Some(shape)));
        assert!(!controller.apply_selection(Some(shape)));
        assert!(!controller.apply_selection(Some(shape)));
        assert_eq!(highlighted(&controller), vec![shape]);

        assert!(controller.apply_selection(None));
        assert!(!controller.apply_selection(None));
    }

    #[test]
    fn test_pointer_picks_shape_in_front_of_camera() {
        let mut controller = controller();
        let shape = controller.shapes()[5];
        let position = controller.scene().object(shape).unwrap().transform.position;
        aim_at(&mut controller, position);

        // Keep the random layout from putting another shape in the way
        for id in controller.handles.shapes.clone() {
            if id != shape {
                controller.scene.object_mut(id).unwrap().visible = false;
            }
        }

        assert!(controller.pointer_moved((0.0, 0.0)));
        assert_eq!(controller.selection(), Some(shape));
        assert_eq!(highlighted(&controller), vec![shape]);

        assert!(!controller.pointer_moved((0.0, 0.0)));
    }

    #[test]
    fn test_pointer_on_empty_sky_clears_selection() {
        let mut controller = controller();
        let shape = controller.shapes()[0];
        controller.apply_selection(Some(shape));

        let camera = &mut controller.camera_manager_mut().camera;
        camera.eye = Vector3::new(0.0, 50.0, 0.0);
        camera.target = Vector3::new(100.0, 60.0, 0.0);

        assert!(controller.pointer_moved((0.0, 0.0)));
        assert_eq!(controller.selection(), None);
        assert!(highlighted(&controller).is_empty());
    }

    #[test]
    fn test_frame_animates_sphere() {
        let mut controller = controller();
        controller.frame(0.0);
        let sphere = controller.handles.animated_sphere;
        let position = controller.scene().object(sphere).unwrap().transform.position;
        assert_eq!(position.y, 2.0);
        assert_eq!(position.x, config::ANIMATED_SPHERE_POSITION.x);
        assert_eq!(position.z, config::ANIMATED_SPHERE_POSITION.z);
    }

    #[test]
    fn test_resize_updates_aspect_and_surface() {
        let mut controller = controller();
        let mut surface = FakeSurface { size: (1200, 800) };

        controller.resize(&mut surface, 1000, 300);
        assert_eq!(controller.camera().aspect, 1000.0 / 300.0);
        assert_eq!(surface.size(), (1000, 300));

        controller.resize(&mut surface, 0, 300);
        assert_eq!(surface.size(), (1000, 300));
    }

    #[test]
    fn test_loaded_model_and_texture_are_applied() {
        let mut controller = controller();
        let objects = controller.scene().statistics().objects;

        controller.apply_load_event(LoadEvent::Finished(
            AssetKind::CrateModel,
            LoadedAsset::Model(Object::single(
                "crate",
                crate::gfx::geometry::generate_cube(),
                Default::default(),
            )),
        ));
        controller.apply_load_event(LoadEvent::Finished(
            AssetKind::BrickTexture,
            LoadedAsset::Texture(TextureImage::solid([200, 80, 60, 255])),
        ));

        assert_eq!(controller.scene().statistics().objects, objects + 1);
        assert!(controller.handles.brick_texture.is_ready());
    }

    #[test]
    fn test_failed_skybox_falls_back_to_color() {
        let mut controller = controller();
        controller.apply_load_event(LoadEvent::Failed(
            AssetKind::Skybox,
            crate::error::AssetError::UnsupportedFormat("test".to_string()),
        ));

        match &controller.scene().background {
            Some(Background::Color(color)) => assert_eq!(*color, config::FALLBACK_BACKGROUND),
            _ => panic!("expected the fallback color"),
        }
    }

    #[test]
    fn test_failed_model_adds_nothing() {
        let mut controller = controller();
        let objects = controller.scene().statistics().objects;
        controller.apply_load_event(LoadEvent::Failed(
            AssetKind::BirdModel,
            crate::error::AssetError::EmptyModel("bird.obj".into()),
        ));
        assert_eq!(controller.scene().statistics().objects, objects);
        assert!(controller.scene().background.is_none());
    }
}
