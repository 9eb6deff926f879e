//! Material definitions and their GPU bindings
//!
//! A [`Material`] is plain CPU data owned by a mesh. The renderer packs it,
//! together with the mesh's model matrix, into a [`MeshUniform`] and binds it
//! with the material's texture map (or a white fallback) at group 1.

use std::sync::Arc;

use wgpu::Device;

use crate::{
    gfx::resources::texture_resource::{SharedTexture, TextureResource},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// GPU uniform data for one mesh draw
///
/// MUST match the `MeshUniform` struct in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
    /// x: roughness, y: metallic, z: has map, w: receives shadows
    pub params: [f32; 4],
}

pub type MeshUBO = UniformBuffer<MeshUniform>;

/// Layout for the per-mesh bind group: uniform, map texture, map sampler
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group Layout");

        MaterialBindings { bind_group_layout }
    }

    pub fn create_bind_group(
        &self,
        device: &Device,
        ubo: &MeshUBO,
        map: &TextureResource,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.bind_group_layout)
            .resource(ubo.binding_resource())
            .texture(&map.view)
            .sampler(&map.sampler)
            .create(device, label)
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

/// Surface description of a mesh
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Self-lit term; used as the picking highlight
    pub emissive: [f32; 3],
    pub map: Option<Arc<SharedTexture>>,
    /// Render both faces (disables back-face culling)
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            map: None,
            double_sided: false,
        }
    }
}

impl Material {
    /// Creates a new material with basic PBR properties
    ///
    /// # Arguments
    /// * `name` - Name for this material
    /// * `base_color` - RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Opaque material with the given RGB color
    pub fn rgb(name: &str, rgb: [f32; 3]) -> Self {
        Self::new(name, [rgb[0], rgb[1], rgb[2], 1.0], 0.0, 0.5)
    }

    /// Builder pattern: Set base color from RGB values
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b, self.base_color[3]];
        self
    }

    /// Builder pattern: Set emissive color
    pub fn with_emission(mut self, r: f32, g: f32, b: f32) -> Self {
        self.emissive = [r, g, b];
        self
    }

    /// Builder pattern: Set texture map
    pub fn with_map(mut self, map: Arc<SharedTexture>) -> Self {
        self.map = Some(map);
        self
    }

    /// Builder pattern: Render both faces
    pub fn with_double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    pub fn color(&self) -> [f32; 3] {
        [self.base_color[0], self.base_color[1], self.base_color[2]]
    }

    pub fn set_color(&mut self, rgb: [f32; 3]) {
        self.base_color = [rgb[0], rgb[1], rgb[2], self.base_color[3]];
    }

    /// True once the map (if any) has an image to sample
    pub fn map_ready(&self) -> bool {
        self.map.as_ref().is_some_and(|map| map.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_builder() {
        let material = Material::rgb("red", [1.0, 0.0, 0.0])
            .with_emission(0.1, 0.2, 0.3)
            .with_double_sided();

        assert_eq!(material.color(), [1.0, 0.0, 0.0]);
        assert_eq!(material.base_color[3], 1.0);
        assert_eq!(material.emissive, [0.1, 0.2, 0.3]);
        assert!(material.double_sided);
        assert!(!material.map_ready());
    }

    #[test]
    fn test_map_ready_follows_shared_texture() {
        let brick = SharedTexture::new("brick");
        let material = Material::default().with_map(brick.clone());
        assert!(!material.map_ready());

        brick.fill(crate::gfx::resources::texture_resource::TextureImage::solid([
            200, 80, 60, 255,
        ]));
        assert!(material.map_ready());
    }

    #[test]
    fn test_metallic_and_roughness_are_clamped() {
        let material = Material::new("m", [1.0; 4], 2.0, -1.0);
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
    }
}
