// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use log::debug;
use std::path::Path;
use std::rc::Rc;

use crate::backend::TextureBackend;
use crate::decode::{PixelLayout, TextureImage};
use crate::error::TextureError;
use crate::sampler::SamplerSettings;
use crate::settings::TextureSettings;
use crate::unit::TextureUnit;

/// GL default for `GL_UNPACK_ALIGNMENT`.
const DEFAULT_UNPACK_ALIGNMENT: i32 = 4;

/// A 2D texture uploaded from an image. The GPU object lives until
/// [`Texture::dispose`] is called or the texture is dropped.
pub struct Texture<B: TextureBackend = glow::Context> {
    gl: Rc<B>,
    handle: Option<B::Texture>,
    width: u32,
    height: u32,
    layout: PixelLayout,
    max_units: u32,
}

impl<B: TextureBackend> Texture<B> {
    /// Loads `path` with the default filtering (linear, repeat, mipmapped).
    ///
    /// # Safety
    ///
    /// The context behind `gl` must be current on this thread, now and
    /// whenever this texture is bound or dropped.
    pub unsafe fn from_path(gl: &Rc<B>, path: impl AsRef<Path>) -> Result<Self, TextureError> {
        Self::from_path_with(gl, path, &TextureSettings::default())
    }

    /// # Safety
    ///
    /// See [`Texture::from_path`].
    pub unsafe fn from_path_with(
        gl: &Rc<B>,
        path: impl AsRef<Path>,
        settings: &TextureSettings,
    ) -> Result<Self, TextureError> {
        settings.sampler.validate()?;
        // Decode first so a bad file never costs a texture name.
        let image = TextureImage::from_path(path.as_ref(), settings.flip_vertically)?;
        Self::from_image(gl, &image, &settings.sampler)
    }

    /// Creates the texture object, leaves it bound to unit 0 and uploads `image`.
    ///
    /// # Safety
    ///
    /// See [`Texture::from_path`].
    pub unsafe fn from_image(
        gl: &Rc<B>,
        image: &TextureImage,
        sampler: &SamplerSettings,
    ) -> Result<Self, TextureError> {
        sampler.validate()?;
        let width = i32::try_from(image.width).map_err(|_| TextureError::TooLarge {
            width: image.width,
            height: image.height,
        })?;
        let height = i32::try_from(image.height).map_err(|_| TextureError::TooLarge {
            width: image.width,
            height: image.height,
        })?;
        if image.pixels.len() != image.expected_len() {
            return Err(TextureError::PixelDataMismatch {
                expected: image.expected_len(),
                actual: image.pixels.len(),
            });
        }

        let handle = gl.create_texture().map_err(TextureError::Allocation)?;
        let texture = Self {
            gl: Rc::clone(gl),
            handle: Some(handle),
            width: image.width,
            height: image.height,
            layout: image.layout,
            max_units: gl.max_texture_units(),
        };
        texture.use_unit(TextureUnit::TEXTURE0)?;

        for (parameter, value) in sampler.parameters() {
            gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value);
        }

        let alignment = image.row_alignment();
        let realign = alignment < DEFAULT_UNPACK_ALIGNMENT;
        if realign {
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment);
        }
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            width,
            height,
            image.layout.gl_format(),
            glow::UNSIGNED_BYTE,
            &image.pixels,
        );
        if realign {
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, DEFAULT_UNPACK_ALIGNMENT);
        }

        if sampler.generate_mipmaps {
            gl.generate_mipmap(glow::TEXTURE_2D);
        }

        debug!(
            "Created texture {:?}: {}x{} {:?}",
            handle, image.width, image.height, image.layout
        );
        Ok(texture)
    }

    /// Binds to texture unit 0.
    pub fn bind(&self) -> Result<(), TextureError> {
        self.use_unit(TextureUnit::TEXTURE0)
    }

    /// Makes `unit` active and binds this texture to it.
    pub fn use_unit(&self, unit: TextureUnit) -> Result<(), TextureError> {
        let handle = self.handle.ok_or(TextureError::Disposed)?;
        if unit.0 >= self.max_units {
            return Err(TextureError::InvalidUnit {
                unit: unit.0,
                max: self.max_units,
            });
        }
        // SAFETY: context currency is the caller's obligation from construction.
        unsafe {
            self.gl.active_texture(unit.to_gl());
            self.gl.bind_texture(glow::TEXTURE_2D, Some(handle));
        }
        Ok(())
    }

    /// Deletes the GPU texture. Later calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            unsafe {
                self.gl.delete_texture(handle);
            }
            debug!("Deleted texture {:?}", handle);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }

    pub fn handle(&self) -> Option<B::Texture> {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }
}

impl<B: TextureBackend> Drop for Texture<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GlCall, RecordingBackend};
    use crate::sampler::{MagFilter, MinFilter, WrapMode};
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn rgba_image(width: u32, height: u32) -> TextureImage {
        TextureImage {
            width,
            height,
            layout: PixelLayout::Rgba,
            pixels: vec![255; (width * height * 4) as usize],
        }
    }

    fn deletes(calls: &[GlCall]) -> usize {
        calls
            .iter()
            .filter(|call| matches!(call, GlCall::DeleteTexture(_)))
            .count()
    }

    #[test]
    fn test_creation_follows_upload_sequence() {
        let gl = Rc::new(RecordingBackend::new());
        let texture =
            unsafe { Texture::from_image(&gl, &rgba_image(4, 2), &SamplerSettings::default()) }
                .unwrap();

        assert_eq!(texture.handle(), Some(1));
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::CreateTexture(1),
                GlCall::ActiveTexture(glow::TEXTURE0),
                GlCall::BindTexture {
                    target: glow::TEXTURE_2D,
                    texture: Some(1)
                },
                GlCall::TexParameter {
                    target: glow::TEXTURE_2D,
                    parameter: glow::TEXTURE_MIN_FILTER,
                    value: glow::LINEAR as i32
                },
                GlCall::TexParameter {
                    target: glow::TEXTURE_2D,
                    parameter: glow::TEXTURE_MAG_FILTER,
                    value: glow::LINEAR as i32
                },
                GlCall::TexParameter {
                    target: glow::TEXTURE_2D,
                    parameter: glow::TEXTURE_WRAP_S,
                    value: glow::REPEAT as i32
                },
                GlCall::TexParameter {
                    target: glow::TEXTURE_2D,
                    parameter: glow::TEXTURE_WRAP_T,
                    value: glow::REPEAT as i32
                },
                GlCall::TexImage2D {
                    target: glow::TEXTURE_2D,
                    level: 0,
                    internal_format: glow::RGBA as i32,
                    width: 4,
                    height: 2,
                    format: glow::RGBA,
                    ty: glow::UNSIGNED_BYTE,
                    bytes: 32
                },
                GlCall::GenerateMipmap(glow::TEXTURE_2D),
            ]
        );
    }

    #[test]
    fn test_custom_sampler_skips_mipmaps() {
        let gl = Rc::new(RecordingBackend::new());
        let sampler = SamplerSettings {
            min_filter: MinFilter::Nearest,
            mag_filter: MagFilter::Nearest,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::MirroredRepeat,
            generate_mipmaps: false,
        };

        let _texture = unsafe { Texture::from_image(&gl, &rgba_image(1, 1), &sampler) }.unwrap();

        let calls = gl.calls();
        assert!(calls.contains(&GlCall::TexParameter {
            target: glow::TEXTURE_2D,
            parameter: glow::TEXTURE_WRAP_S,
            value: glow::CLAMP_TO_EDGE as i32
        }));
        assert!(!calls.contains(&GlCall::GenerateMipmap(glow::TEXTURE_2D)));
    }

    #[test]
    fn test_odd_width_rgb_upload_relaxes_unpack_alignment() {
        for (width, alignment) in [(3, 1), (2, 2), (6, 2)] {
            let gl = Rc::new(RecordingBackend::new());
            let image = TextureImage {
                width,
                height: 3,
                layout: PixelLayout::Rgb,
                pixels: vec![0; (width * 3 * 3) as usize],
            };

            let _texture =
                unsafe { Texture::from_image(&gl, &image, &SamplerSettings::default()) }.unwrap();

            let calls = gl.calls();
            let upload = calls
                .iter()
                .position(|call| matches!(call, GlCall::TexImage2D { .. }))
                .unwrap();
            assert_eq!(
                calls[upload - 1],
                GlCall::PixelStore {
                    parameter: glow::UNPACK_ALIGNMENT,
                    value: alignment
                },
                "width {}",
                width
            );
            assert_eq!(
                calls[upload + 1],
                GlCall::PixelStore {
                    parameter: glow::UNPACK_ALIGNMENT,
                    value: 4
                }
            );
            assert!(matches!(
                calls[upload],
                GlCall::TexImage2D {
                    internal_format,
                    format: glow::RGB,
                    ..
                } if internal_format == glow::RGBA as i32
            ));
        }
    }

    #[test]
    fn test_aligned_rgb_upload_leaves_unpack_alignment_alone() {
        let gl = Rc::new(RecordingBackend::new());
        let image = TextureImage {
            width: 4,
            height: 1,
            layout: PixelLayout::Rgb,
            pixels: vec![0; 12],
        };

        let _texture =
            unsafe { Texture::from_image(&gl, &image, &SamplerSettings::default()) }.unwrap();

        assert!(!gl
            .calls()
            .iter()
            .any(|call| matches!(call, GlCall::PixelStore { .. })));
    }

    #[test]
    fn test_short_pixel_buffer_never_allocates() {
        let gl = Rc::new(RecordingBackend::new());
        let image = TextureImage {
            width: 64,
            height: 64,
            layout: PixelLayout::Rgba,
            pixels: vec![0; 4],
        };

        let result = unsafe { Texture::from_image(&gl, &image, &SamplerSettings::default()) };

        assert!(matches!(
            result,
            Err(TextureError::PixelDataMismatch {
                expected: 16384,
                actual: 4
            })
        ));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_oversized_pixel_buffer_is_rejected() {
        let gl = Rc::new(RecordingBackend::new());
        let mut image = rgba_image(2, 2);
        image.pixels.push(0);

        let result = unsafe { Texture::from_image(&gl, &image, &SamplerSettings::default()) };

        assert!(matches!(
            result,
            Err(TextureError::PixelDataMismatch {
                expected: 16,
                actual: 17
            })
        ));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_dimensions_beyond_i32_are_too_large() {
        let gl = Rc::new(RecordingBackend::new());
        let image = TextureImage {
            width: u32::MAX,
            height: 1,
            layout: PixelLayout::Rgba,
            pixels: Vec::new(),
        };

        let result = unsafe { Texture::from_image(&gl, &image, &SamplerSettings::default()) };

        assert!(matches!(
            result,
            Err(TextureError::TooLarge {
                width: u32::MAX,
                height: 1
            })
        ));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let gl = Rc::new(RecordingBackend::new().failing_allocation());
        let result =
            unsafe { Texture::from_image(&gl, &rgba_image(2, 2), &SamplerSettings::default()) };

        assert!(matches!(result, Err(TextureError::Allocation(_))));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_bad_file_never_allocates() {
        let dir = tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let gl = Rc::new(RecordingBackend::new());

        let result = unsafe { Texture::from_path(&gl, &path) };

        assert!(matches!(result, Err(TextureError::Decode(_))));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_invalid_sampler_never_allocates() {
        let gl = Rc::new(RecordingBackend::new());
        let sampler = SamplerSettings {
            min_filter: MinFilter::LinearMipmapLinear,
            generate_mipmaps: false,
            ..Default::default()
        };

        let result = unsafe { Texture::from_image(&gl, &rgba_image(2, 2), &sampler) };

        assert!(matches!(result, Err(TextureError::IncompleteMipmaps(_))));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_from_path_uploads_rgb_png() {
        let dir = tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("wall.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&path).unwrap();
        let gl = Rc::new(RecordingBackend::new());

        let texture = unsafe { Texture::from_path(&gl, &path) }.unwrap();

        assert_eq!((texture.width(), texture.height()), (4, 4));
        assert_eq!(texture.layout(), PixelLayout::Rgb);
        assert!(gl.calls().contains(&GlCall::TexImage2D {
            target: glow::TEXTURE_2D,
            level: 0,
            internal_format: glow::RGBA as i32,
            width: 4,
            height: 4,
            format: glow::RGB,
            ty: glow::UNSIGNED_BYTE,
            bytes: 48
        }));
    }

    #[test]
    fn test_from_path_with_applies_settings() {
        let dir = tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("face.png");
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 1, Rgba([9, 9, 9, 9]));
        img.save(&path).unwrap();
        let gl = Rc::new(RecordingBackend::new());
        let settings = TextureSettings {
            flip_vertically: true,
            sampler: SamplerSettings {
                mag_filter: MagFilter::Nearest,
                ..Default::default()
            },
        };

        let texture = unsafe { Texture::from_path_with(&gl, &path, &settings) }.unwrap();

        assert_eq!((texture.width(), texture.height()), (1, 2));
        assert_eq!(texture.layout(), PixelLayout::Rgba);
        assert!(gl.calls().contains(&GlCall::TexParameter {
            target: glow::TEXTURE_2D,
            parameter: glow::TEXTURE_MAG_FILTER,
            value: glow::NEAREST as i32
        }));
    }

    #[test]
    fn test_use_unit_activates_requested_unit() {
        let gl = Rc::new(RecordingBackend::new());
        let texture =
            unsafe { Texture::from_image(&gl, &rgba_image(1, 1), &SamplerSettings::default()) }
                .unwrap();
        gl.clear();

        texture.use_unit(TextureUnit(2)).unwrap();

        assert_eq!(
            gl.calls(),
            vec![
                GlCall::ActiveTexture(glow::TEXTURE2),
                GlCall::BindTexture {
                    target: glow::TEXTURE_2D,
                    texture: Some(1)
                },
            ]
        );
    }

    #[test]
    fn test_bind_defaults_to_unit_zero() {
        let gl = Rc::new(RecordingBackend::new());
        let texture =
            unsafe { Texture::from_image(&gl, &rgba_image(1, 1), &SamplerSettings::default()) }
                .unwrap();
        gl.clear();

        texture.bind().unwrap();

        assert_eq!(gl.calls()[0], GlCall::ActiveTexture(glow::TEXTURE0));
    }

    #[test]
    fn test_unit_beyond_context_limit_is_rejected() {
        let gl = Rc::new(RecordingBackend::new().with_max_units(16));
        let texture =
            unsafe { Texture::from_image(&gl, &rgba_image(1, 1), &SamplerSettings::default()) }
                .unwrap();
        gl.clear();

        let result = texture.use_unit(TextureUnit(16));

        assert!(matches!(
            result,
            Err(TextureError::InvalidUnit { unit: 16, max: 16 })
        ));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_dispose_deletes_texture_once() {
        let gl = Rc::new(RecordingBackend::new());
        let mut texture =
            unsafe { Texture::from_image(&gl, &rgba_image(1, 1), &SamplerSettings::default()) }
                .unwrap();

        texture.dispose();
        texture.dispose();
        assert!(texture.is_disposed());
        drop(texture);

        let calls = gl.calls();
        assert_eq!(deletes(&calls), 1);
        assert_eq!(calls.last(), Some(&GlCall::DeleteTexture(1)));
    }

    #[test]
    fn test_bind_after_dispose_fails() {
        let gl = Rc::new(RecordingBackend::new());
        let mut texture =
            unsafe { Texture::from_image(&gl, &rgba_image(1, 1), &SamplerSettings::default()) }
                .unwrap();
        texture.dispose();
        gl.clear();

        assert!(matches!(texture.bind(), Err(TextureError::Disposed)));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn test_drop_releases_handle() {
        let gl = Rc::new(RecordingBackend::new());
        {
            let _first =
                unsafe { Texture::from_image(&gl, &rgba_image(1, 1), &SamplerSettings::default()) }
                    .unwrap();
            let _second =
                unsafe { Texture::from_image(&gl, &rgba_image(1, 1), &SamplerSettings::default()) }
                    .unwrap();
        }

        let calls = gl.calls();
        assert_eq!(deletes(&calls), 2);
        assert!(calls.contains(&GlCall::DeleteTexture(1)));
        assert!(calls.contains(&GlCall::DeleteTexture(2)));
    }
}
