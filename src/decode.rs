// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use image::{ColorType, DynamicImage, GenericImageView, ImageReader};
use log::debug;
use std::path::Path;

use crate::error::TextureError;
use crate::scope_timer::ScopeTimer;

/// Order and count of the channels handed to `glTexImage2D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Rgba,
}

impl PixelLayout {
    /// Colour images without alpha (24-bit RGB) keep three channels.
    /// Anything else, including grayscale and paletted images, goes up as RGBA.
    pub fn for_color_type(color: ColorType) -> Self {
        if color.has_color() && !color.has_alpha() {
            PixelLayout::Rgb
        } else {
            PixelLayout::Rgba
        }
    }

    pub fn gl_format(self) -> u32 {
        match self {
            PixelLayout::Rgb => glow::RGB,
            PixelLayout::Rgba => glow::RGBA,
        }
    }

    pub fn channels(self) -> u32 {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// Decoded 8-bit pixels ready for upload, rows top to bottom unless flipped.
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn from_path(path: &Path, flip_vertically: bool) -> Result<Self, TextureError> {
        let _timer = ScopeTimer::new(format!("decode {}", path.display()));
        let io_err = |source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        };
        let image = ImageReader::open(path)
            .map_err(io_err)?
            .with_guessed_format()
            .map_err(io_err)?
            .decode()?;
        debug!("Decoded {:?} as {:?}", path, image.color());
        Self::from_dynamic(image, flip_vertically)
    }

    pub fn from_memory(bytes: &[u8], flip_vertically: bool) -> Result<Self, TextureError> {
        let image = image::load_from_memory(bytes)?;
        Self::from_dynamic(image, flip_vertically)
    }

    pub fn from_dynamic(image: DynamicImage, flip_vertically: bool) -> Result<Self, TextureError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyImage { width, height });
        }
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(TextureError::TooLarge { width, height });
        }

        let image = if flip_vertically { image.flipv() } else { image };
        let layout = PixelLayout::for_color_type(image.color());
        let pixels = match layout {
            PixelLayout::Rgb => image.into_rgb8().into_raw(),
            PixelLayout::Rgba => image.into_rgba8().into_raw(),
        };

        Ok(Self {
            width,
            height,
            layout,
            pixels,
        })
    }

    /// Bytes `glTexImage2D` reads for this size and layout.
    pub fn expected_len(&self) -> usize {
        self.row_bytes().saturating_mul(self.height as usize)
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.layout.channels() as usize
    }

    /// Largest `GL_UNPACK_ALIGNMENT` the rows satisfy.
    pub fn row_alignment(&self) -> i32 {
        let row = self.row_bytes();
        [8, 4, 2]
            .into_iter()
            .find(|align| row % *align as usize == 0)
            .unwrap_or(1)
    }

    pub fn mip_levels(&self) -> u32 {
        mip_level_count(self.width, self.height)
    }
}

/// Levels in a full mipmap chain, down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}
