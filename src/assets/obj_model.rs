//! Wavefront OBJ import with an external material library
//!
//! Loading is two steps: the `.mtl` library is read first and then handed to
//! the OBJ parser in place of whatever `mtllib` the file names. Meshes whose
//! material declares no diffuse map are recoloured with a fallback colour.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::texture::load_texture_image;
use crate::error::{AssetError, AssetResult};
use crate::gfx::geometry::GeometryData;
use crate::gfx::resources::{Material, SharedTexture};
use crate::gfx::scene::{Mesh, Object};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

fn open(path: &Path) -> AssetResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Parsed `.mtl` file plus one texture handle per declared diffuse map
pub struct MaterialLibrary {
    pub materials: Vec<tobj::Material>,
    maps: HashMap<String, Arc<SharedTexture>>,
    base_dir: PathBuf,
}

impl MaterialLibrary {
    /// Parses a material library; maps are created empty
    pub fn parse<B: BufRead>(reader: &mut B, path: &Path) -> AssetResult<Self> {
        let (materials, _) = tobj::load_mtl_buf(reader).map_err(|source| AssetError::Mtl {
            path: path.to_path_buf(),
            source,
        })?;

        let maps = materials
            .iter()
            .filter_map(|m| m.diffuse_texture.clone())
            .map(|file| {
                let texture = SharedTexture::new(file.clone());
                (file, texture)
            })
            .collect();

        Ok(Self {
            materials,
            maps,
            base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        })
    }

    /// Decodes every declared map next to the library file
    ///
    /// A map that fails to load stays empty and its meshes draw untextured.
    /// Returns the number of maps that were filled.
    pub fn load_maps(&self) -> usize {
        let mut loaded = 0;
        for (file, texture) in &self.maps {
            match load_texture_image(&self.base_dir.join(file)) {
                Ok(image) => {
                    texture.fill(image);
                    loaded += 1;
                }
                Err(err) => log::warn!("Texture map {file} unavailable: {err}"),
            }
        }
        loaded
    }

    pub fn map(&self, file: &str) -> Option<&Arc<SharedTexture>> {
        self.maps.get(file)
    }

    /// Material converted for rendering, `fallback` applied when there is no map
    fn material(&self, index: usize, fallback: [f32; 3]) -> Material {
        let Some(source) = self.materials.get(index) else {
            return Material::rgb("OBJ fallback", fallback);
        };

        let diffuse = source.diffuse.unwrap_or([0.8, 0.8, 0.8]);
        let mut material = Material::new(
            &source.name,
            [diffuse[0], diffuse[1], diffuse[2], source.dissolve.unwrap_or(1.0)],
            0.0,
            1.0 - (source.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
        );

        match source.diffuse_texture.as_deref().and_then(|file| self.map(file)) {
            Some(map) => material.map = Some(map.clone()),
            None => material.set_color(fallback),
        }
        material
    }

    /// Stands in for the OBJ's own `mtllib` lookups
    fn as_loader(&self) -> impl Fn(&Path) -> tobj::MTLLoadResult + '_ {
        move |_: &Path| {
            let names = self
                .materials
                .iter()
                .enumerate()
                .map(|(index, m)| (m.name.clone(), index))
                .collect();
            Ok((self.materials.clone(), names))
        }
    }
}

/// First step: the material library and its maps
pub fn load_materials(path: &Path) -> AssetResult<MaterialLibrary> {
    let library = MaterialLibrary::parse(&mut open(path)?, path)?;
    let loaded = library.load_maps();
    log::debug!(
        "Loaded {} materials and {loaded} maps from {}",
        library.materials.len(),
        path.display()
    );
    Ok(library)
}

/// Second step: the mesh, using an already loaded library
pub fn load_obj_model(
    path: &Path,
    library: &MaterialLibrary,
    fallback_color: [f32; 3],
) -> AssetResult<Object> {
    parse_obj(&mut open(path)?, path, library, fallback_color)
}

pub fn parse_obj<B: BufRead>(
    reader: &mut B,
    path: &Path,
    library: &MaterialLibrary,
    fallback_color: [f32; 3],
) -> AssetResult<Object> {
    let (models, _) =
        tobj::load_obj_buf(reader, &load_options(), library.as_loader()).map_err(|source| {
            AssetError::Obj {
                path: path.to_path_buf(),
                source,
            }
        })?;

    let meshes: Vec<Mesh> = models
        .iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let material = match model.mesh.material_id {
                Some(index) => library.material(index, fallback_color),
                None => Material::rgb("OBJ fallback", fallback_color),
            };
            Mesh::new(model.name.clone(), geometry_from_obj(&model.mesh), material)
        })
        .collect();

    if meshes.is_empty() {
        return Err(AssetError::EmptyModel(path.to_path_buf()));
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    Ok(Object::new(name, meshes))
}

fn geometry_from_obj(mesh: &tobj::Mesh) -> GeometryData {
    let mut geometry = GeometryData::new();
    geometry.vertices = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    geometry.indices = mesh.indices.clone();

    // OBJ texture space starts at the bottom left
    geometry.tex_coords = mesh
        .texcoords
        .chunks_exact(2)
        .map(|t| [t[0], 1.0 - t[1]])
        .collect();

    if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
        geometry.normals = mesh
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect();
    } else {
        geometry.compute_normals();
    }

    geometry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const GREEN: [f32; 3] = [0.0, 1.0, 0.0];

    const MTL: &str = "\
newmtl body
Kd 0.2 0.3 0.4
newmtl skin
Kd 0.9 0.9 0.9
map_Kd skin.png
";

    const OBJ: &str = "\
mtllib bird.mtl
o body
v 0 0 0
v 1 0 0
v 0 1 0
usemtl body
f 1 2 3
o wing
v 0 0 1
v 1 0 1
v 0 1 1
vt 0 0
vt 1 0
vt 0 1
usemtl skin
f 4/1 5/2 6/3
";

    fn library() -> MaterialLibrary {
        MaterialLibrary::parse(&mut Cursor::new(MTL), Path::new("models/bird.mtl")).unwrap()
    }

    fn bird() -> Object {
        parse_obj(
            &mut Cursor::new(OBJ),
            Path::new("models/bird.obj"),
            &library(),
            GREEN,
        )
        .unwrap()
    }

    #[test]
    fn test_library_declares_one_map() {
        let library = library();
        assert_eq!(library.materials.len(), 2);
        let map = library.map("skin.png").unwrap();
        assert!(!map.is_ready());
        assert!(library.map("body.png").is_none());
    }

    #[test]
    fn test_mesh_without_map_gets_fallback_color() {
        let bird = bird();
        assert_eq!(bird.name, "bird");
        assert_eq!(bird.meshes.len(), 2);

        let body = &bird.meshes[0];
        assert_eq!(body.name, "body");
        assert_eq!(body.material.color(), GREEN);
        assert!(body.material.map.is_none());
    }

    #[test]
    fn test_mesh_with_map_keeps_its_color() {
        let bird = bird();
        let wing = &bird.meshes[1];
        assert_eq!(wing.material.color(), [0.9, 0.9, 0.9]);
        assert!(wing.material.map.is_some());
        // v flipped into wgpu texture space
        assert_eq!(wing.geometry.tex_coords[0], [0.0, 1.0]);
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let bird = bird();
        for normal in &bird.meshes[0].geometry.normals {
            assert_eq!(*normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_missing_map_file_leaves_map_empty() {
        let library =
            MaterialLibrary::parse(&mut Cursor::new(MTL), Path::new("/nonexistent/bird.mtl"))
                .unwrap();
        assert_eq!(library.load_maps(), 0);
        assert!(!library.map("skin.png").unwrap().is_ready());
    }

    #[test]
    fn test_empty_obj_is_rejected() {
        let result = parse_obj(
            &mut Cursor::new("# nothing\n"),
            Path::new("empty.obj"),
            &library(),
            GREEN,
        );
        assert!(matches!(result, Err(AssetError::EmptyModel(_))));
    }
}
