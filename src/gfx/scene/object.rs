use std::ops::Range;

use cgmath::{Matrix, Matrix4, Rad, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::gfx::{
    geometry::GeometryData,
    resources::{
        material::{MaterialBindings, MeshUBO, MeshUniform},
        texture_resource::TextureResource,
        Material,
    },
};

/// Position, Euler rotation (radians, XYZ order) and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// T * Rx * Ry * Rz * S
    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z));
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }
}

/// GPU buffers and bindings of a single mesh
pub struct MeshGpuResources {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform: MeshUBO,
    bind_group: wgpu::BindGroup,
    /// Whether the bind group samples the material's real map
    map_bound: bool,
}

/// Geometry plus material, the unit of drawing
pub struct Mesh {
    pub name: String,
    pub geometry: GeometryData,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    gpu_resources: Option<MeshGpuResources>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, geometry: GeometryData, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
            gpu_resources: None,
        }
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu_resources.is_some()
    }

    fn uniform(&self, model: &Matrix4<f32>) -> MeshUniform {
        let normal_matrix = model.invert().map(|m| m.transpose()).unwrap_or(*model);
        let m = &self.material;
        MeshUniform {
            model: (*model).into(),
            normal_matrix: normal_matrix.into(),
            base_color: m.base_color,
            emissive: [m.emissive[0], m.emissive[1], m.emissive[2], 0.0],
            params: [
                m.roughness,
                m.metallic,
                if m.map_ready() { 1.0 } else { 0.0 },
                if self.receive_shadow { 1.0 } else { 0.0 },
            ],
        }
    }

    /// Creates buffers on first call, then keeps the uniform in sync
    ///
    /// The bind group is rebuilt once when a shared map finishes loading.
    fn sync_gpu(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bindings: &MaterialBindings,
        fallback_map: &TextureResource,
        model: &Matrix4<f32>,
    ) {
        let uniform = self.uniform(model);
        let map = self
            .material
            .map
            .as_ref()
            .and_then(|map| map.gpu(device, queue));

        match self.gpu_resources.as_mut() {
            Some(gpu) => {
                gpu.uniform.update_content(queue, uniform);
                if !gpu.map_bound {
                    if let Some(map) = map {
                        gpu.bind_group =
                            bindings.create_bind_group(device, &gpu.uniform, map, &self.name);
                        gpu.map_bound = true;
                    }
                }
            }
            None => {
                let vertices = self.geometry.to_vertices();
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Vertex Buffer ({})", self.name)),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Index Buffer ({})", self.name)),
                    contents: bytemuck::cast_slice(&self.geometry.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                let uniform = MeshUBO::new_with_data(device, &uniform);
                let bind_group = bindings.create_bind_group(
                    device,
                    &uniform,
                    map.unwrap_or(fallback_map),
                    &self.name,
                );

                self.gpu_resources = Some(MeshGpuResources {
                    vertex_buffer,
                    index_buffer,
                    index_count: self.geometry.indices.len() as u32,
                    uniform,
                    bind_group,
                    map_bound: map.is_some(),
                });
            }
        }
    }
}

/// A named group of meshes sharing one transform: a primitive shape, a
/// textured cube, or a whole loaded model
pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Transform,
    pub visible: bool,
}

impl Object {
    /// Create a new Object with identity transformation
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            meshes,
            transform: Transform::default(),
            visible: true,
        }
    }

    /// Object made of exactly one mesh
    pub fn single(name: impl Into<String>, geometry: GeometryData, material: Material) -> Self {
        let name = name.into();
        let mesh = Mesh::new(name.clone(), geometry, material);
        Self::new(name, vec![mesh])
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.transform.scale = Vector3::new(scale, scale, scale);
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.set_shadows(cast, receive);
        self
    }

    /// Sets both flags on every mesh
    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        for mesh in &mut self.meshes {
            mesh.cast_shadow = cast;
            mesh.receive_shadow = receive;
        }
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.transform.position = position;
    }

    pub fn set_emissive(&mut self, color: [f32; 3]) {
        for mesh in &mut self.meshes {
            mesh.material.emissive = color;
        }
    }

    /// Emissive color of the first mesh, black for an empty object
    pub fn emissive(&self) -> [f32; 3] {
        self.meshes
            .first()
            .map(|mesh| mesh.material.emissive)
            .unwrap_or([0.0; 3])
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.transform.matrix()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.triangle_count()).sum()
    }

    /// Creates missing GPU resources and uploads current transform/material
    pub fn sync_gpu_resources(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bindings: &MaterialBindings,
        fallback_map: &TextureResource,
    ) {
        let model = self.model_matrix();
        for mesh in &mut self.meshes {
            mesh.sync_gpu(device, queue, bindings, fallback_map, &model);
        }
    }

    /// Number of meshes currently holding GPU buffers
    pub fn gpu_resource_count(&self) -> usize {
        self.meshes.iter().filter(|m| m.has_gpu_resources()).count()
    }

    /// Drops all GPU buffers and bind groups
    pub fn release_gpu_resources(&mut self) {
        for mesh in &mut self.meshes {
            mesh.gpu_resources = None;
        }
    }
}

/// Which meshes a pass draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFilter {
    All,
    ShadowCasters,
    SingleSided,
    DoubleSided,
}

impl MeshFilter {
    fn accepts(self, mesh: &Mesh) -> bool {
        match self {
            MeshFilter::All => true,
            MeshFilter::ShadowCasters => mesh.cast_shadow,
            MeshFilter::SingleSided => !mesh.material.double_sided,
            MeshFilter::DoubleSided => mesh.material.double_sided,
        }
    }
}

/// Draw calls for scene meshes on a render pass
pub trait DrawObject {
    fn draw_mesh(&mut self, mesh: &Mesh, bind_group_index: u32);
    fn draw_mesh_instanced(&mut self, mesh: &Mesh, bind_group_index: u32, instances: Range<u32>);
    fn draw_object(&mut self, object: &Object, bind_group_index: u32, filter: MeshFilter);
}

impl DrawObject for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh, bind_group_index: u32) {
        self.draw_mesh_instanced(mesh, bind_group_index, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &Mesh, bind_group_index: u32, instances: Range<u32>) {
        // Skip drawing if not uploaded
        let Some(gpu) = &mesh.gpu_resources else {
            return;
        };

        self.set_bind_group(bind_group_index, &gpu.bind_group, &[]);
        self.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        self.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..gpu.index_count, 0, instances);
    }

    fn draw_object(&mut self, object: &Object, bind_group_index: u32, filter: MeshFilter) {
        if !object.visible {
            return;
        }
        for mesh in object.meshes.iter().filter(|m| filter.accepts(m)) {
            self.draw_mesh(mesh, bind_group_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn test_transform_matrix_order() {
        let transform = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };

        // Scale first, then rotate +X towards -Z, then translate
        let p = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        let expected = Vector4::new(1.0, 2.0, 1.0, 1.0);
        assert!((p - expected).magnitude() < 1e-5, "got {:?}", p);
    }

    #[test]
    fn test_shadow_flags_apply_to_every_mesh() {
        let mut object = Object::new(
            "pair",
            vec![
                Mesh::new("a", generate_cube(), Material::default()),
                Mesh::new("b", generate_cube(), Material::default()),
            ],
        );
        object.set_shadows(true, true);
        assert!(object.meshes.iter().all(|m| m.cast_shadow && m.receive_shadow));
    }

    #[test]
    fn test_emissive_applies_to_every_mesh() {
        let mut object = Object::single("cube", generate_cube(), Material::default());
        assert_eq!(object.emissive(), [0.0; 3]);
        object.set_emissive([1.0, 0.0, 0.0]);
        assert_eq!(object.emissive(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_objects_start_without_gpu_resources() {
        let object = Object::single("cube", generate_cube(), Material::default());
        assert_eq!(object.gpu_resource_count(), 0);
        assert_eq!(object.triangle_count(), 12);
    }
}
