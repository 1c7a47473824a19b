// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use glow::HasContext;
use std::cell::{Cell, RefCell};
use std::fmt::Debug;

use crate::unit::MIN_TEXTURE_UNITS;

/// The slice of OpenGL a [`Texture`](crate::Texture) needs.
///
/// # Safety
///
/// Every method talks to the current context. Callers must make sure the
/// context the backend was created from is current on this thread.
pub trait TextureBackend {
    type Texture: Copy + Debug + PartialEq;

    unsafe fn create_texture(&self) -> Result<Self::Texture, String>;
    unsafe fn active_texture(&self, unit: u32);
    unsafe fn bind_texture(&self, target: u32, texture: Option<Self::Texture>);
    unsafe fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    unsafe fn pixel_store_i32(&self, parameter: u32, value: i32);
    #[allow(clippy::too_many_arguments)]
    unsafe fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    );
    unsafe fn generate_mipmap(&self, target: u32);
    unsafe fn delete_texture(&self, texture: Self::Texture);
    unsafe fn max_texture_units(&self) -> u32;
}

impl TextureBackend for glow::Context {
    type Texture = glow::Texture;

    unsafe fn create_texture(&self) -> Result<Self::Texture, String> {
        HasContext::create_texture(self)
    }

    unsafe fn active_texture(&self, unit: u32) {
        HasContext::active_texture(self, unit);
    }

    unsafe fn bind_texture(&self, target: u32, texture: Option<Self::Texture>) {
        HasContext::bind_texture(self, target, texture);
    }

    unsafe fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        HasContext::tex_parameter_i32(self, target, parameter, value);
    }

    unsafe fn pixel_store_i32(&self, parameter: u32, value: i32) {
        HasContext::pixel_store_i32(self, parameter, value);
    }

    unsafe fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    ) {
        // Border must always be 0.
        HasContext::tex_image_2d(
            self,
            target,
            level,
            internal_format,
            width,
            height,
            0,
            format,
            ty,
            Some(pixels),
        );
    }

    unsafe fn generate_mipmap(&self, target: u32) {
        HasContext::generate_mipmap(self, target);
    }

    unsafe fn delete_texture(&self, texture: Self::Texture) {
        HasContext::delete_texture(self, texture);
    }

    unsafe fn max_texture_units(&self) -> u32 {
        let units = HasContext::get_parameter_i32(self, glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS);
        u32::try_from(units).unwrap_or(MIN_TEXTURE_UNITS)
    }
}

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlCall {
    CreateTexture(u32),
    ActiveTexture(u32),
    BindTexture {
        target: u32,
        texture: Option<u32>,
    },
    TexParameter {
        target: u32,
        parameter: u32,
        value: i32,
    },
    PixelStore {
        parameter: u32,
        value: i32,
    },
    TexImage2D {
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        bytes: usize,
    },
    GenerateMipmap(u32),
    DeleteTexture(u32),
}

/// Backend without a driver behind it. Hands out sequential texture names
/// and keeps a log of every call, so the upload sequence can be inspected
/// headless.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: RefCell<Vec<GlCall>>,
    next_name: Cell<u32>,
    max_units: u32,
    fail_allocation: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next_name: Cell::new(1),
            max_units: MIN_TEXTURE_UNITS,
            fail_allocation: false,
        }
    }

    pub fn with_max_units(mut self, max_units: u32) -> Self {
        self.max_units = max_units;
        self
    }

    /// Makes every `create_texture` fail, like a context that is out of names.
    pub fn failing_allocation(mut self) -> Self {
        self.fail_allocation = true;
        self
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl TextureBackend for RecordingBackend {
    type Texture = u32;

    unsafe fn create_texture(&self) -> Result<u32, String> {
        if self.fail_allocation {
            return Err(String::from("no texture names available"));
        }
        let name = self.next_name.get();
        self.next_name.set(name + 1);
        self.record(GlCall::CreateTexture(name));
        Ok(name)
    }

    unsafe fn active_texture(&self, unit: u32) {
        self.record(GlCall::ActiveTexture(unit));
    }

    unsafe fn bind_texture(&self, target: u32, texture: Option<u32>) {
        self.record(GlCall::BindTexture { target, texture });
    }

    unsafe fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        self.record(GlCall::TexParameter {
            target,
            parameter,
            value,
        });
    }

    unsafe fn pixel_store_i32(&self, parameter: u32, value: i32) {
        self.record(GlCall::PixelStore { parameter, value });
    }

    unsafe fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    ) {
        self.record(GlCall::TexImage2D {
            target,
            level,
            internal_format,
            width,
            height,
            format,
            ty,
            bytes: pixels.len(),
        });
    }

    unsafe fn generate_mipmap(&self, target: u32) {
        self.record(GlCall::GenerateMipmap(target));
    }

    unsafe fn delete_texture(&self, texture: u32) {
        self.record(GlCall::DeleteTexture(texture));
    }

    unsafe fn max_texture_units(&self) -> u32 {
        self.max_units
    }
}
