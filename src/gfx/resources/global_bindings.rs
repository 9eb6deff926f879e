//! Global uniform bindings for camera and scene data
//!
//! Manages the uniform buffer and bind group for per-frame state shared by
//! every draw: camera matrices, the scene's lights, fog and background, and
//! the directional light's shadow map.

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    gfx::{
        camera::{camera_utils::Camera, OrbitCamera},
        resources::texture_resource::TextureResource,
        scene::{Background, LightKind, Scene},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Half size of the cube covered by the directional shadow map
pub const SHADOW_HALF_EXTENT: f32 = 60.0;

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    /// Used by the skybox to turn clip positions back into view rays
    pub inv_view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    /// rgb: summed ambient radiance
    pub ambient: [f32; 4],
    /// xyz: direction the light travels, w: 1 if present
    pub dir_light_direction: [f32; 4],
    /// rgb: radiance, w: 1 if it casts shadows
    pub dir_light_color: [f32; 4],
    /// xyz: position, w: range
    pub point_light_position: [f32; 4],
    /// rgb: radiance, w: 1 if present
    pub point_light_color: [f32; 4],
    /// rgb: color, w: density (0 disables fog)
    pub fog: [f32; 4],
    /// rgb: clear color, w: 1 if a skybox is bound
    pub background: [f32; 4],
}

impl GlobalUniform {
    /// Collects everything the shaders need from the scene and camera
    ///
    /// Multiple ambient lights add up; only the first directional and the
    /// first point light are used.
    pub fn from_scene(scene: &Scene, camera: &OrbitCamera, fallback_background: [f32; 3]) -> Self {
        let view_proj = camera.build_view_projection_matrix();
        let inv_view_proj = view_proj.invert().unwrap_or(Matrix4::identity());

        let mut content = Self {
            view_position: camera.uniform.view_position,
            view_proj: view_proj.into(),
            inv_view_proj: inv_view_proj.into(),
            light_view_proj: Matrix4::<f32>::identity().into(),
            ambient: [0.0; 4],
            dir_light_direction: [0.0, -1.0, 0.0, 0.0],
            dir_light_color: [0.0; 4],
            point_light_position: [0.0; 4],
            point_light_color: [0.0; 4],
            fog: [0.0; 4],
            background: [
                fallback_background[0],
                fallback_background[1],
                fallback_background[2],
                0.0,
            ],
        };

        let mut has_directional = false;
        let mut has_point = false;
        for light in scene.lights() {
            let [r, g, b] = light.radiance();
            match light.kind {
                LightKind::Ambient => {
                    content.ambient[0] += r;
                    content.ambient[1] += g;
                    content.ambient[2] += b;
                }
                LightKind::Directional { .. } if !has_directional => {
                    has_directional = true;
                    if let Some(dir) = light.direction() {
                        content.dir_light_direction = [dir.x, dir.y, dir.z, 1.0];
                    }
                    let shadow = if light.cast_shadow { 1.0 } else { 0.0 };
                    content.dir_light_color = [r, g, b, shadow];
                    if let Some(m) = light.shadow_view_proj(SHADOW_HALF_EXTENT) {
                        content.light_view_proj = m.into();
                    }
                }
                LightKind::Point { position, range } if !has_point => {
                    has_point = true;
                    content.point_light_position = [position.x, position.y, position.z, range];
                    content.point_light_color = [r, g, b, 1.0];
                }
                _ => {}
            }
        }

        if let Some(fog) = &scene.fog {
            content.fog = [fog.color[0], fog.color[1], fog.color[2], fog.density];
        }

        match &scene.background {
            Some(Background::Color(c)) => content.background = [c[0], c[1], c[2], 0.0],
            Some(Background::Cubemap(_)) => content.background[3] = 1.0,
            None => {}
        }

        content
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Bind group 0 of every scene pipeline: globals, shadow map, skybox
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Globals Bind Group Layout");

        GlobalBindings { bind_group_layout }
    }

    /// Builds the bind group; rebuilt whenever the skybox changes
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        ubo: &GlobalUBO,
        shadow_map: &TextureResource,
        skybox: &TextureResource,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.bind_group_layout)
            .resource(ubo.binding_resource())
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .texture(&skybox.view)
            .sampler(&skybox.sampler)
            .create(device, "Global Bind Group")
    }

    /// Returns the bind group layout
    ///
    /// Used when creating render pipelines that need access to global uniforms.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::gfx::scene::{Fog, Light};

    fn camera() -> OrbitCamera {
        OrbitCamera::from_config(1.5)
    }

    #[test]
    fn test_empty_scene_uses_fallback_background() {
        let scene = Scene::new();
        let globals = GlobalUniform::from_scene(&scene, &camera(), [0.8, 0.8, 0.8]);

        assert_eq!(globals.background, [0.8, 0.8, 0.8, 0.0]);
        assert_eq!(globals.ambient, [0.0; 4]);
        assert_eq!(globals.dir_light_direction[3], 0.0);
        assert_eq!(globals.point_light_color[3], 0.0);
        assert_eq!(globals.fog[3], 0.0);
    }

    #[test]
    fn test_lights_and_fog_are_collected() {
        let mut scene = Scene::new();
        scene.add_light(Light::ambient([0.25; 3], 1.0));
        scene.add_light(Light::ambient([0.25; 3], 1.0));
        scene.add_light(
            Light::directional([1.0; 3], 1.0, Vector3::new(10.0, 20.0, 10.0)).with_shadows(),
        );
        scene.add_light(
            Light::point([1.0, 0.5, 0.0], 2.0, 100.0, Vector3::new(0.0, 15.0, 0.0)).with_shadows(),
        );
        scene.set_fog(Fog::exp2([0.8; 3], 0.01));

        let globals = GlobalUniform::from_scene(&scene, &camera(), [0.0; 3]);

        assert_eq!(&globals.ambient[..3], &[0.5, 0.5, 0.5]);
        assert_eq!(globals.dir_light_direction[3], 1.0);
        assert!(globals.dir_light_direction[1] < 0.0);
        assert_eq!(globals.dir_light_color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(globals.point_light_position, [0.0, 15.0, 0.0, 100.0]);
        assert_eq!(globals.point_light_color, [2.0, 1.0, 0.0, 1.0]);
        assert_eq!(globals.fog, [0.8, 0.8, 0.8, 0.01]);
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        assert_ne!(globals.light_view_proj, identity);
    }

    #[test]
    fn test_color_background_overrides_fallback() {
        let mut scene = Scene::new();
        scene.set_background(Background::Color([0.1, 0.2, 0.3]));
        let globals = GlobalUniform::from_scene(&scene, &camera(), [0.8; 3]);
        assert_eq!(globals.background, [0.1, 0.2, 0.3, 0.0]);
    }
}
