// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

/// Index of a texture image unit. Shaders sampling more than one texture
/// bind each to its own unit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct TextureUnit(pub u32);

impl TextureUnit {
    pub const TEXTURE0: TextureUnit = TextureUnit(0);

    /// The `GL_TEXTUREi` enum for this unit.
    pub fn to_gl(self) -> u32 {
        glow::TEXTURE0 + self.0
    }
}

/// OpenGL requires every context to expose at least this many units.
pub const MIN_TEXTURE_UNITS: u32 = 16;
