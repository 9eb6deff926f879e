//! glTF / GLB model import
//!
//! The node hierarchy of the default scene is flattened: every node's world
//! transform is baked into the vertices of its meshes, so the resulting
//! [`Object`] starts with an identity transform of its own.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};
use gltf::mesh::Mode;

use crate::error::{AssetError, AssetResult};
use crate::gfx::geometry::GeometryData;
use crate::gfx::resources::{Material, SharedTexture, TextureImage};
use crate::gfx::scene::{Mesh, Object};

pub fn load_gltf_model(path: &Path) -> AssetResult<Object> {
    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    let object = object_from_document(&name, &document, &buffers, &images);
    if object.meshes.is_empty() {
        return Err(AssetError::EmptyModel(path.to_path_buf()));
    }

    log::debug!(
        "Imported {} with {} meshes, {} triangles",
        path.display(),
        object.meshes.len(),
        object.triangle_count()
    );
    Ok(object)
}

/// Builds an object from an already imported document
pub fn object_from_document(
    name: &str,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Object {
    let mut importer = Importer {
        buffers,
        images,
        textures: HashMap::new(),
        meshes: Vec::new(),
    };

    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            importer.visit(node, Matrix4::identity());
        }
    }

    Object::new(name, importer.meshes)
}

struct Importer<'a> {
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
    /// Images shared by several materials are converted once
    textures: HashMap<usize, Arc<SharedTexture>>,
    meshes: Vec<Mesh>,
}

impl Importer<'_> {
    fn visit(&mut self, node: gltf::Node, parent: Matrix4<f32>) {
        let world = parent * Matrix4::from(node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != Mode::Triangles {
                    log::warn!(
                        "Skipping {:?} primitive in mesh {:?}",
                        primitive.mode(),
                        mesh.name()
                    );
                    continue;
                }

                let Some(mut geometry) = self.read_geometry(&primitive) else {
                    continue;
                };
                geometry.apply_matrix(&world);

                let material = self.read_material(primitive.material());
                let name = mesh
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
                self.meshes.push(Mesh::new(name, geometry, material));
            }
        }

        for child in node.children() {
            self.visit(child, world);
        }
    }

    fn read_geometry(&self, primitive: &gltf::Primitive) -> Option<GeometryData> {
        let buffers = self.buffers;
        let reader =
            primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

        let mut geometry = GeometryData::new();
        geometry.vertices = reader.read_positions()?.collect();
        if geometry.vertices.is_empty() {
            return None;
        }

        geometry.indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..geometry.vertices.len() as u32).collect(),
        };
        let vertex_count = geometry.vertices.len();
        if let Some(&index) = geometry.indices.iter().find(|&&i| i as usize >= vertex_count) {
            log::warn!(
                "Skipping primitive {}: index {index} out of range for {vertex_count} vertices",
                primitive.index()
            );
            return None;
        }
        if let Some(tex_coords) = reader.read_tex_coords(0) {
            geometry.tex_coords = tex_coords.into_f32().collect();
        }

        match reader.read_normals() {
            Some(normals) => geometry.normals = normals.collect(),
            None => geometry.compute_normals(),
        }

        Some(geometry)
    }

    fn read_material(&mut self, source: gltf::Material) -> Material {
        let pbr = source.pbr_metallic_roughness();
        let mut material = Material::new(
            source.name().unwrap_or("glTF material"),
            pbr.base_color_factor(),
            pbr.metallic_factor(),
            pbr.roughness_factor(),
        );
        material.emissive = source.emissive_factor();
        material.double_sided = source.double_sided();

        if let Some(info) = pbr.base_color_texture() {
            let index = info.texture().source().index();
            if let Some(texture) = self.texture(index) {
                material.map = Some(texture);
            }
        }
        material
    }

    fn texture(&mut self, index: usize) -> Option<Arc<SharedTexture>> {
        if let Some(texture) = self.textures.get(&index) {
            return Some(texture.clone());
        }

        let data = self.images.get(index)?;
        match rgba_from_gltf(data) {
            Ok(image) => {
                let texture = SharedTexture::from_image(format!("glTF image {index}"), image);
                self.textures.insert(index, texture.clone());
                Some(texture)
            }
            Err(err) => {
                log::warn!("Ignoring glTF image {index}: {err}");
                None
            }
        }
    }
}

/// Expands 8-bit glTF image data to RGBA8
fn rgba_from_gltf(data: &gltf::image::Data) -> AssetResult<TextureImage> {
    use gltf::image::Format;

    let rgba = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => return Err(AssetError::UnsupportedFormat(format!("{other:?}"))),
    };

    Ok(TextureImage::new(data.width, data.height, rgba))
}
