// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

//! Loads image files into OpenGL 2D textures: decode, create, configure
//! sampling, upload, generate mipmaps, then bind or dispose.

pub mod backend;
pub mod decode;
pub mod error;
pub mod sampler;
pub mod settings;
pub mod texture;
pub mod unit;

mod scope_timer;

pub use backend::{GlCall, RecordingBackend, TextureBackend};
pub use decode::{mip_level_count, PixelLayout, TextureImage};
pub use error::TextureError;
pub use sampler::{MagFilter, MinFilter, SamplerSettings, WrapMode};
pub use settings::{LoggingSettings, Settings, SettingsError, TextureSettings};
pub use texture::Texture;
pub use unit::TextureUnit;
