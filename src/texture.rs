//! Texture and framebuffer allocation, plus the ping-pong accumulator pair.

use log::debug;

use crate::error::GpuError;
use crate::gpu::{consts::*, Gl};

/// Creates a texture with linear filtering and edge clamping. It stays bound to
/// the active texture unit on return.
pub fn create_texture<G: Gl>(gl: &G) -> Result<G::Texture, GpuError> {
    let texture = gl.create_texture().ok_or(GpuError::Create("texture"))?;
    gl.bind_texture(TEXTURE_2D, Some(&texture));
    gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MIN_FILTER, LINEAR as i32);
    gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MAG_FILTER, LINEAR as i32);
    gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_S, CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_T, CLAMP_TO_EDGE as i32);
    Ok(texture)
}

/// An off-screen render target and the texture it renders into.
pub struct RenderTarget<G: Gl> {
    pub framebuffer: G::Framebuffer,
    pub texture: G::Texture,
    pub width: u32,
    pub height: u32,
}

/// Allocates an RGBA8 texture of the given size with no initial data and wraps it
/// in a framebuffer.
///
/// Fails with [`GpuError::FramebufferIncomplete`] if the driver rejects the
/// attachment, e.g. for a zero-sized texture.
pub fn create_framebuffer<G: Gl>(
    gl: &G,
    width: u32,
    height: u32,
) -> Result<RenderTarget<G>, GpuError> {
    let texture = create_texture(gl)?;
    if let Err(reason) = gl.tex_image_empty_rgba8(width as i32, height as i32) {
        gl.bind_texture(TEXTURE_2D, None);
        gl.delete_texture(&texture);
        return Err(GpuError::Upload(reason));
    }

    let Some(framebuffer) = gl.create_framebuffer() else {
        gl.bind_texture(TEXTURE_2D, None);
        gl.delete_texture(&texture);
        return Err(GpuError::Create("framebuffer"));
    };
    gl.bind_framebuffer(FRAMEBUFFER, Some(&framebuffer));
    gl.framebuffer_texture_2d(FRAMEBUFFER, COLOR_ATTACHMENT0, TEXTURE_2D, Some(&texture));

    let status = gl.check_framebuffer_status(FRAMEBUFFER);

    gl.bind_texture(TEXTURE_2D, None);
    gl.bind_framebuffer(FRAMEBUFFER, None);

    let target = RenderTarget {
        framebuffer,
        texture,
        width,
        height,
    };
    if status != FRAMEBUFFER_COMPLETE {
        target.delete(gl);
        return Err(GpuError::FramebufferIncomplete { status });
    }
    Ok(target)
}

impl<G: Gl> RenderTarget<G> {
    /// Releases the framebuffer and its texture.
    pub fn delete(self, gl: &G) {
        gl.delete_framebuffer(&self.framebuffer);
        gl.delete_texture(&self.texture);
    }
}

/// Two render targets that alternate between holding the previous accumulated
/// result ("read") and receiving the next one ("write").
pub struct PingPong<G: Gl> {
    targets: [RenderTarget<G>; 2],
    /// Index of the current write target (0 or 1).
    write: usize,
}

impl<G: Gl> PingPong<G> {
    pub fn new(gl: &G, width: u32, height: u32) -> Result<Self, GpuError> {
        debug!("allocating ping-pong accumulator {width}x{height}");
        let first = create_framebuffer(gl, width, height)?;
        let second = match create_framebuffer(gl, width, height) {
            Ok(second) => second,
            Err(err) => {
                first.delete(gl);
                return Err(err);
            }
        };
        Ok(Self {
            targets: [first, second],
            write: 1,
        })
    }

    pub fn read(&self) -> &RenderTarget<G> {
        &self.targets[1 - self.write]
    }

    pub fn write(&self) -> &RenderTarget<G> {
        &self.targets[self.write]
    }

    /// Exchanges the read and write labels. No GPU work.
    pub fn swap(&mut self) {
        self.write = 1 - self.write;
    }

    pub fn size(&self) -> (u32, u32) {
        let target = &self.targets[0];
        (target.width, target.height)
    }
}
