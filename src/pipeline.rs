//! Per-frame orchestration: mask estimate, accumulation pass, display pass.
//!
//! A tick awaits exactly once, on the mask estimate. Everything after that runs
//! synchronously to completion. The estimate for frame N may resolve after the
//! video element has already advanced, so the video uploaded in a tick is not
//! guaranteed to be the sample the mask was computed from. The skew is at most a
//! frame or so and is accepted for live feedback; ticks are not lockstepped.

use log::{debug, info};

use crate::config::CompositorConfig;
use crate::error::{GpuError, InitError, PipelineError};
use crate::geometry::FullScreenQuad;
use crate::gpu::{consts::*, Gl, ImageDimensions};
use crate::mask::MaskSource;
use crate::operation::{OpCode, Operation, OperationSelector};
use crate::program::{
    ProgramCache, U_BOOLEAN_TEXTURE, U_MASK_TEXTURE, U_OPERATION, U_PREVIOUS_TEXTURE,
    U_WEBCAM_TEXTURE,
};
use crate::shader::ShaderSources;
use crate::texture::{create_texture, PingPong};

/// Texture units. The mask stays on its unit between ticks so a stale mask can
/// still be sampled when nobody is detected.
pub const VIDEO_UNIT: u32 = 0;
pub const MASK_UNIT: u32 = 1;
pub const ACCUMULATED_UNIT: u32 = 2;
pub const PREVIOUS_UNIT: u32 = 3;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub frame: u64,
    pub detections: usize,
    /// The operation the accumulation pass ran with, if it ran.
    pub accumulated: Option<Operation>,
}

/// All GPU state of the compositor, owned in one place.
pub struct FramePipeline<G: Gl> {
    gl: G,
    programs: ProgramCache<G>,
    quad: FullScreenQuad<G>,
    video_texture: G::Texture,
    mask_texture: G::Texture,
    accumulator: PingPong<G>,
    selector: OperationSelector,
    frame_number: u64,
    log_first_frames: u64,
    mask_size: Option<(u32, u32)>,
}

impl<G: Gl> FramePipeline<G> {
    /// Links the programs and allocates textures, geometry and the accumulator
    /// pair sized to the drawing buffer.
    pub fn new(
        gl: G,
        sources: &ShaderSources,
        selector: OperationSelector,
        config: &CompositorConfig,
    ) -> Result<Self, InitError> {
        let programs = ProgramCache::build(&gl, sources)?;

        gl.active_texture(TEXTURE0 + VIDEO_UNIT);
        let video_texture = create_texture(&gl)?;
        gl.active_texture(TEXTURE0 + MASK_UNIT);
        let mask_texture = create_texture(&gl)?;
        gl.active_texture(TEXTURE0 + VIDEO_UNIT);
        gl.pixel_store_i32(UNPACK_FLIP_Y_WEBGL, 1);

        let quad = FullScreenQuad::new(&gl)?;

        let (width, height) = gl.drawing_buffer_size();
        let accumulator = PingPong::new(&gl, width.max(0) as u32, height.max(0) as u32)?;

        Ok(Self {
            gl,
            programs,
            quad,
            video_texture,
            mask_texture,
            accumulator,
            selector,
            frame_number: 0,
            log_first_frames: config.log_first_frames,
            mask_size: None,
        })
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn accumulator(&self) -> &PingPong<G> {
        &self.accumulator
    }

    pub fn selector(&self) -> &OperationSelector {
        &self.selector
    }

    pub fn mask_texture(&self) -> &G::Texture {
        &self.mask_texture
    }

    pub fn video_texture(&self) -> &G::Texture {
        &self.video_texture
    }

    pub fn frames(&self) -> u64 {
        self.frame_number
    }

    /// Runs one frame against the current video sample.
    pub async fn tick<M>(
        &mut self,
        video: &G::Image,
        masks: &mut M,
    ) -> Result<TickReport, PipelineError>
    where
        M: MaskSource<G::Image>,
    {
        let frame = self.frame_number;
        if frame < self.log_first_frames {
            info!("frame {frame}");
        }
        self.frame_number += 1;

        let estimate = masks.estimate(video).await?;
        let people = estimate.people;

        let mut accumulated = None;
        if let Some(first) = estimate.first {
            self.upload_mask(&first.mask)?;

            let operation = self.selector.consume();
            if let Some(code) = operation.shader_code() {
                match first.score {
                    Some(score) => {
                        debug!("running {operation} on {people} poses, first score {score:.2}")
                    }
                    None => debug!("running {operation} on {people} poses"),
                }
                self.accumulate(code);
                accumulated = Some(operation);
            }
        }

        self.display(video)?;

        Ok(TickReport {
            frame,
            detections: people,
            accumulated,
        })
    }

    fn upload_mask(&mut self, mask: &G::Image) -> Result<(), GpuError> {
        let size = mask.dimensions();
        if self.mask_size != Some(size) {
            debug!("mask size {}x{}", size.0, size.1);
            self.mask_size = Some(size);
        }
        self.gl.active_texture(TEXTURE0 + MASK_UNIT);
        self.gl.bind_texture(TEXTURE_2D, Some(&self.mask_texture));
        self.gl.tex_image_from(mask).map_err(GpuError::Upload)
    }

    /// Feedback pass: the previous result and the new mask go in, the new
    /// result lands in the write target.
    fn accumulate(&mut self, code: OpCode) {
        self.accumulator.swap();

        let gl = &self.gl;
        let (width, height) = self.accumulator.size();
        gl.bind_framebuffer(FRAMEBUFFER, Some(&self.accumulator.write().framebuffer));
        gl.viewport(0, 0, width as i32, height as i32);

        let program = &self.programs.boolean;
        program.activate(gl);
        program.set_u32(gl, U_OPERATION, code.get());

        gl.active_texture(TEXTURE0 + PREVIOUS_UNIT);
        gl.bind_texture(TEXTURE_2D, Some(&self.accumulator.read().texture));
        program.set_sampler(gl, U_PREVIOUS_TEXTURE, PREVIOUS_UNIT);
        program.set_sampler(gl, U_MASK_TEXTURE, MASK_UNIT);

        self.quad.draw(gl);
    }

    /// Composites video, mask and the newest accumulated result onto the canvas.
    fn display(&self, video: &G::Image) -> Result<(), GpuError> {
        let gl = &self.gl;
        gl.bind_framebuffer(FRAMEBUFFER, None);
        let (width, height) = gl.drawing_buffer_size();
        gl.viewport(0, 0, width, height);

        let program = &self.programs.display;
        program.activate(gl);

        gl.active_texture(TEXTURE0 + VIDEO_UNIT);
        gl.bind_texture(TEXTURE_2D, Some(&self.video_texture));
        gl.tex_image_from(video).map_err(GpuError::Upload)?;
        program.set_sampler(gl, U_WEBCAM_TEXTURE, VIDEO_UNIT);
        program.set_sampler(gl, U_MASK_TEXTURE, MASK_UNIT);

        gl.active_texture(TEXTURE0 + ACCUMULATED_UNIT);
        gl.bind_texture(TEXTURE_2D, Some(&self.accumulator.write().texture));
        program.set_sampler(gl, U_BOOLEAN_TEXTURE, ACCUMULATED_UNIT);

        self.quad.draw(gl);
        Ok(())
    }
}
