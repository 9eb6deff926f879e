//! WGPU-based rendering engine
//!
//! Owns the surface, device and every GPU resource that is not per-mesh, and
//! draws a [`Scene`] in three passes:
//!
//! 1. Shadow depth pass from the directional light
//! 2. Forward pass over all meshes (single- and double-sided pipelines)
//! 3. Skybox pass behind everything, when a cube texture is bound

use std::sync::Arc;

use anyhow::{anyhow, Context};
use wgpu::Device;

use crate::{
    config,
    gfx::{
        camera::OrbitCamera,
        resources::{
            global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform},
            material::MaterialBindings,
            texture_resource::{CubeTexture, TextureImage, TextureResource},
        },
        scene::{Background, DrawObject, MeshFilter, Scene},
    },
    wgpu_utils::{
        binding_builder::BindGroupBuilder, binding_builder::BindGroupLayoutBuilder,
        binding_types, uniform_buffer::UniformBuffer,
    },
};

use super::{
    pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager},
    RenderSurface,
};

const SHADOW_MAP_SIZE: u32 = 2048;

const SHADOW_PIPELINE: &str = "Shadow";
const SCENE_PIPELINE: &str = "Scene";
const SCENE_DOUBLE_SIDED_PIPELINE: &str = "SceneDoubleSided";
const SKYBOX_PIPELINE: &str = "Skybox";

/// Light matrix for the shadow pass
///
/// MUST match `ShadowUniform` in `shadow.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ShadowUniform {
    light_view_proj: [[f32; 4]; 4],
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pub pipeline_manager: PipelineManager,

    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    global_bind_group: wgpu::BindGroup,
    material_bindings: MaterialBindings,

    // Shadow mapping resources
    shadow_map: TextureResource,
    shadow_ubo: UniformBuffer<ShadowUniform>,
    shadow_bind_group: wgpu::BindGroup,

    /// Bound wherever a material has no ready map
    white_map: TextureResource,
    /// Bound until a skybox arrives
    placeholder_sky: TextureResource,
    bound_skybox: Option<Arc<CubeTexture>>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Initializes wgpu, creates the depth buffer and shadow map, and
    /// compiles the shadow, scene and skybox pipelines.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Textures are sRGB and lighting is linear, so present through an sRGB view
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {}x{} {:?} on {}",
            config.width,
            config.height,
            format,
            adapter.get_info().name
        );

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);

        let white_map = TextureResource::create_from_rgba_data(
            &device,
            &queue,
            &TextureImage::solid([255; 4]).rgba,
            1,
            1,
            "White Map",
        );
        let placeholder_sky = TextureResource::create_cube(
            &device,
            &queue,
            &std::array::from_fn(|_| TextureImage::solid([0, 0, 0, 255])),
            "Placeholder Skybox",
        );

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device);
        let global_bind_group =
            global_bindings.create_bind_group(&device, &global_ubo, &shadow_map, &placeholder_sky);
        let material_bindings = MaterialBindings::new(&device);

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Shadow Pass Bind Group Layout");
        let shadow_ubo = UniformBuffer::<ShadowUniform>::new(&device);
        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .resource(shadow_ubo.binding_resource())
            .create(&device, "Shadow Pass Bind Group");

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("shaders/scene.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shaders/shadow.wgsl"));
        pipeline_manager.load_shader("skybox", include_str!("shaders/skybox.wgsl"));

        // No culling in the shadow pass so thin and open meshes still cast
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_depth(DepthConfig {
                    bias: wgpu::DepthBiasState {
                        constant: 2,
                        slope_scale: 2.0,
                        clamp: 0.0,
                    },
                    ..DepthConfig::new(TextureResource::DEPTH_FORMAT)
                })
                .with_bind_group_layouts(vec![
                    shadow_layout.layout.clone(),
                    material_bindings.bind_group_layout().clone(),
                ]),
        );

        let scene_layouts = vec![
            global_bindings.bind_group_layout().clone(),
            material_bindings.bind_group_layout().clone(),
        ];
        pipeline_manager.register_pipeline(
            SCENE_PIPELINE,
            PipelineConfig::default()
                .with_label("SCENE")
                .with_shader("scene")
                .with_color_format(format)
                .with_depth(DepthConfig::new(TextureResource::DEPTH_FORMAT))
                .with_bind_group_layouts(scene_layouts.clone()),
        );
        pipeline_manager.register_pipeline(
            SCENE_DOUBLE_SIDED_PIPELINE,
            PipelineConfig::default()
                .with_label("SCENE DOUBLE SIDED")
                .with_shader("scene")
                .with_color_format(format)
                .with_cull_mode(None)
                .with_depth(DepthConfig::new(TextureResource::DEPTH_FORMAT))
                .with_bind_group_layouts(scene_layouts),
        );

        // Drawn last at the far plane, only where nothing else wrote depth
        pipeline_manager.register_pipeline(
            SKYBOX_PIPELINE,
            PipelineConfig::default()
                .with_label("SKYBOX")
                .with_shader("skybox")
                .with_color_format(format)
                .with_cull_mode(None)
                .with_no_vertex_buffers()
                .with_depth(DepthConfig {
                    write_enabled: false,
                    compare: wgpu::CompareFunction::LessEqual,
                    ..DepthConfig::new(TextureResource::DEPTH_FORMAT)
                })
                .with_bind_group_layouts(vec![global_bindings.bind_group_layout().clone()]),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{}", error);
            }
        }
        log::debug!("{:?}", pipeline_manager.get_stats());

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            pipeline_manager,
            global_ubo,
            global_bindings,
            global_bind_group,
            material_bindings,
            shadow_map,
            shadow_ubo,
            shadow_bind_group,
            white_map,
            placeholder_sky,
            bound_skybox: None,
        })
    }

    /// Brings GPU state in line with the scene
    ///
    /// Creates resources for nodes seen for the first time, uploads current
    /// transforms and materials, and rebinds the skybox when it changes.
    pub fn prepare(&mut self, scene: &mut Scene) {
        for (_, object) in scene.objects_mut() {
            object.sync_gpu_resources(
                &self.device,
                &self.queue,
                &self.material_bindings,
                &self.white_map,
            );
        }

        let skybox = match &scene.background {
            Some(Background::Cubemap(cube)) => Some(cube.clone()),
            _ => None,
        };
        let changed = match (&skybox, &self.bound_skybox) {
            (Some(new), Some(old)) => !Arc::ptr_eq(new, old),
            (None, None) => false,
            _ => true,
        };
        if changed {
            let sky_texture = match &skybox {
                Some(cube) => cube.gpu(&self.device, &self.queue),
                None => &self.placeholder_sky,
            };
            self.global_bind_group = self.global_bindings.create_bind_group(
                &self.device,
                &self.global_ubo,
                &self.shadow_map,
                sky_texture,
            );
            log::debug!("Skybox binding updated (bound: {})", skybox.is_some());
            self.bound_skybox = skybox;
        }
    }

    /// Renders one frame of `scene` as seen by `camera`
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped;
    /// only running out of memory is reported to the caller.
    pub fn render_frame(
        &mut self,
        scene: &mut Scene,
        camera: &OrbitCamera,
    ) -> Result<(), wgpu::SurfaceError> {
        self.prepare(scene);

        let globals = GlobalUniform::from_scene(scene, camera, config::FALLBACK_BACKGROUND);
        self.global_ubo.update_content(&self.queue, globals);
        self.shadow_ubo.update_content(
            &self.queue,
            ShadowUniform {
                light_view_proj: globals.light_view_proj,
            },
        );

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface texture timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let pipelines = &self.pipeline_manager;

        // PASS 1: Shadow depth from the directional light
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let casts_shadow = globals.dir_light_color[3] > 0.5;
            if let (true, Some(pipeline)) = (casts_shadow, pipelines.pipeline(SHADOW_PIPELINE)) {
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(0, &self.shadow_bind_group, &[]);
                for (_, object) in scene.objects() {
                    shadow_pass.draw_object(object, 1, MeshFilter::ShadowCasters);
                }
            }
        }

        // PASS 2: Forward shading, then the skybox behind it
        {
            let [r, g, b, _] = globals.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.global_bind_group, &[]);

            for (name, filter) in [
                (SCENE_PIPELINE, MeshFilter::SingleSided),
                (SCENE_DOUBLE_SIDED_PIPELINE, MeshFilter::DoubleSided),
            ] {
                let Some(pipeline) = pipelines.pipeline(name) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                for (_, object) in scene.objects() {
                    render_pass.draw_object(object, 1, filter);
                }
            }

            if self.bound_skybox.is_some() {
                if let Some(pipeline) = pipelines.pipeline(SKYBOX_PIPELINE) {
                    render_pass.set_pipeline(pipeline);
                    render_pass.draw(0..3, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}

impl RenderSurface for RenderEngine {
    /// Reconfigures the surface and recreates the depth buffer
    ///
    /// Zero-sized requests (minimized window) are ignored. The shadow map
    /// has a fixed resolution and is left alone.
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
