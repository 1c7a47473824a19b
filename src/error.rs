// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("IO Error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image decoding Error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Image is too large for a 2D texture ({width}x{height})")]
    TooLarge { width: u32, height: u32 },

    #[error("Pixel buffer holds {actual} bytes, image needs {expected}")]
    PixelDataMismatch { expected: usize, actual: usize },

    #[error("Unable to allocate texture: {0}")]
    Allocation(String),

    #[error("Texture has already been disposed")]
    Disposed,

    #[error("Texture unit {unit} is out of range (context supports {max} units)")]
    InvalidUnit { unit: u32, max: u32 },

    #[error("Min filter {0:?} samples mipmaps but mipmap generation is disabled")]
    IncompleteMipmaps(crate::sampler::MinFilter),
}
