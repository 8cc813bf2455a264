use std::path::Path;
use gl::types::*;
use image::GenericImageView;
use crate::backend::GlBackend;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn gl_enum(&self) -> GLenum {
        match self {
            PixelFormat::Rgb => gl::RGB,
            PixelFormat::Rgba => gl::RGBA,
        }
    }
}

pub struct Image {
    pub dimensions: (u32, u32),
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

/// Decodes an image, keeping alpha only when it has some.
pub fn load_image<P: AsRef<Path>>(path: P, flip_vertically: bool) -> Result<Image, String> {
    let path = path.as_ref();
    let mut decoded = image::open(path).map_err(|e| format!("failed to load {}: {}", path.display(), e))?;
    if flip_vertically {
        decoded = decoded.flipv();
    }
    let dimensions = decoded.dimensions();
    let (format, data) = if decoded.color().has_alpha() {
        (PixelFormat::Rgba, decoded.to_rgba8().into_raw())
    } else {
        (PixelFormat::Rgb, decoded.to_rgb8().into_raw())
    };
    debug!("loaded {} ({}x{}, {:?})", path.display(), dimensions.0, dimensions.1, format);
    Ok(Image { dimensions, format, data })
}

/// A 2D texture object, deleted on drop.
pub struct Texture {
    pub dimensions: (u32, u32),
    pub handle: GLuint,
}

impl Texture {
    pub fn new_from_path<P: AsRef<Path>>(backend: &GlBackend, path: P, flip_vertically: bool) -> Result<Texture, String> {
        let image = load_image(path, flip_vertically)?;
        Ok(Texture::from_image(backend, &image))
    }

    pub fn from_image(backend: &GlBackend, image: &Image) -> Texture {
        let mut texture = Texture::empty(backend);
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, texture.handle);
            // rgb rows aren't always a multiple of four bytes
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                image.format.gl_enum() as GLint,
                image.dimensions.0 as GLsizei,
                image.dimensions.1 as GLsizei,
                0,
                image.format.gl_enum(),
                gl::UNSIGNED_BYTE,
                image.data.as_ptr() as *const GLvoid,
            );
            gl::GenerateMipmap(gl::TEXTURE_2D);
        }
        texture.dimensions = image.dimensions;
        texture
    }

    /// A texture with sampling parameters but no storage; samples as black.
    pub fn empty(_backend: &GlBackend) -> Texture {
        let mut handle: GLuint = 0;
        unsafe {
            gl::GenTextures(1, &mut handle);
            gl::BindTexture(gl::TEXTURE_2D, handle);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR_MIPMAP_LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
        }
        Texture {
            dimensions: (0, 0),
            handle,
        }
    }

    /// Binds to texture unit `unit`, the value a sampler uniform should hold.
    pub fn bind(&self, unit: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, self.handle);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteTextures(1, &self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("opengl-tutorials-{}-{}", std::process::id(), name))
    }

    #[test]
    fn flips_rows_when_asked() {
        let path = temp_path("flip.png");
        let top = Rgb([255, 0, 0]);
        let bottom = Rgb([0, 0, 255]);
        RgbImage::from_fn(3, 2, |_, y| if y == 0 { top } else { bottom }).save(&path).unwrap();

        let upright = load_image(&path, false).unwrap();
        assert_eq!(upright.dimensions, (3, 2));
        assert_eq!(upright.format, PixelFormat::Rgb);
        assert_eq!(&upright.data[0..3], &top.0);

        let flipped = load_image(&path, true).unwrap();
        assert_eq!(&flipped.data[0..3], &bottom.0);
        assert_eq!(&flipped.data[9..12], &top.0);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn keeps_alpha() {
        let path = temp_path("alpha.png");
        RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])).save(&path).unwrap();
        let image = load_image(&path, true).unwrap();
        assert_eq!(image.format, PixelFormat::Rgba);
        assert_eq!(image.data.len(), 16);
        assert_eq!(&image.data[0..4], &[1u8, 2, 3, 4]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_image(temp_path("missing.png"), true).err().unwrap();
        assert!(err.contains("failed to load"));
    }
}
