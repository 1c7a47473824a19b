// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use serde::{Deserialize, Serialize};

use crate::error::TextureError;

/// Filter used when the texture is scaled down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    pub fn to_gl(self) -> u32 {
        match self {
            MinFilter::Nearest => glow::NEAREST,
            MinFilter::Linear => glow::LINEAR,
            MinFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            MinFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
            MinFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
            MinFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }
    }

    /// Whether sampling with this filter reads levels other than 0.
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, MinFilter::Nearest | MinFilter::Linear)
    }
}

/// Filter used when the texture is scaled up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagFilter {
    Nearest,
    Linear,
}

impl MagFilter {
    pub fn to_gl(self) -> u32 {
        match self {
            MagFilter::Nearest => glow::NEAREST,
            MagFilter::Linear => glow::LINEAR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

impl WrapMode {
    pub fn to_gl(self) -> u32 {
        match self {
            WrapMode::Repeat => glow::REPEAT,
            WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
            WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
            WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER,
        }
    }
}

/// Parameters applied to a texture right after its handle is created.
/// `wrap_s` is the X axis, `wrap_t` the Y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerSettings {
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub generate_mipmaps: bool,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            min_filter: MinFilter::Linear,
            mag_filter: MagFilter::Linear,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            generate_mipmaps: true,
        }
    }
}

impl SamplerSettings {
    /// `(parameter, value)` pairs in the order they are applied.
    pub fn parameters(&self) -> [(u32, i32); 4] {
        [
            (glow::TEXTURE_MIN_FILTER, self.min_filter.to_gl() as i32),
            (glow::TEXTURE_MAG_FILTER, self.mag_filter.to_gl() as i32),
            (glow::TEXTURE_WRAP_S, self.wrap_s.to_gl() as i32),
            (glow::TEXTURE_WRAP_T, self.wrap_t.to_gl() as i32),
        ]
    }

    /// A mipmapped min filter on a texture with only level 0 is incomplete
    /// and samples as black.
    pub fn validate(&self) -> Result<(), TextureError> {
        if self.min_filter.uses_mipmaps() && !self.generate_mipmaps {
            return Err(TextureError::IncompleteMipmaps(self.min_filter));
        }
        Ok(())
    }
}
