//! Image decoding for material maps and skybox faces

use std::path::{Path, PathBuf};

use crate::config::SKYBOX_FACES;
use crate::error::{AssetError, AssetResult};
use crate::gfx::resources::{CubeTexture, TextureImage};

/// Decodes an encoded image (PNG, JPEG, ...) into RGBA8
pub fn decode_image(bytes: &[u8], path: &Path) -> AssetResult<TextureImage> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    let (width, height) = rgba.dimensions();
    Ok(TextureImage::new(width, height, rgba.into_raw()))
}

pub fn load_texture_image(path: &Path) -> AssetResult<TextureImage> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes, path)
}

/// Loads the six faces of a skybox, calling `on_face` after each one
pub fn load_cubemap(
    paths: &[PathBuf; 6],
    mut on_face: impl FnMut(usize),
) -> AssetResult<CubeTexture> {
    let mut faces = Vec::with_capacity(6);
    for (index, path) in paths.iter().enumerate() {
        faces.push(load_texture_image(path)?);
        on_face(index + 1);
    }

    let faces: [TextureImage; 6] = faces.try_into().map_err(|faces: Vec<TextureImage>| {
        AssetError::UnsupportedFormat(format!("expected 6 skybox faces, got {}", faces.len()))
    })?;
    cubemap_from_faces(faces)
}

/// Checks that every face is square and matches the first one
pub fn cubemap_from_faces(faces: [TextureImage; 6]) -> AssetResult<CubeTexture> {
    let expected = faces[0].width;
    for (&face, image) in SKYBOX_FACES.iter().zip(&faces) {
        if image.width != expected || image.height != expected {
            return Err(AssetError::SkyboxFace {
                face,
                width: image.width,
                height: image.height,
                expected,
            });
        }
    }
    Ok(CubeTexture::new(faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn image_of(size: u32) -> TextureImage {
        TextureImage::new(size, size, vec![255; (size * size * 4) as usize])
    }

    #[test]
    fn test_decode_png() {
        let mut source = image::RgbaImage::new(3, 2);
        source.put_pixel(2, 1, image::Rgba([10, 20, 30, 255]));

        let mut encoded = Cursor::new(Vec::new());
        source
            .write_to(&mut encoded, image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(encoded.get_ref(), Path::new("mem.png")).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        let last = decoded.rgba.len() - 4;
        assert_eq!(&decoded.rgba[last..], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_garbage_reports_path() {
        let err = decode_image(b"not an image", Path::new("bad.jpg")).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
        assert!(err.to_string().contains("bad.jpg"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_texture_image(Path::new("/nonexistent/brick.jpg")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_cubemap_accepts_matching_faces() {
        let cube = cubemap_from_faces(std::array::from_fn(|_| image_of(4))).unwrap();
        assert_eq!(cube.size(), 4);
    }

    #[test]
    fn test_cubemap_rejects_mismatched_face() {
        let mut faces: [TextureImage; 6] = std::array::from_fn(|_| image_of(4));
        faces[3] = TextureImage::new(4, 2, vec![0; 32]);

        match cubemap_from_faces(faces) {
            Err(AssetError::SkyboxFace {
                face,
                width,
                height,
                expected,
            }) => {
                assert_eq!(face, "ny");
                assert_eq!((width, height, expected), (4, 2, 4));
            }
            _ => panic!("expected a skybox face error"),
        }
    }
}
