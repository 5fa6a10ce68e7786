//! In-memory `Gl` that records calls and emulates just enough of WebGL2 for the
//! pipeline: texture storage, framebuffer completeness, uniform resolution and
//! the boolean fragment contract (via `OpCode::shade`).

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use maskbool_wasm::config::CompositorConfig;
use maskbool_wasm::gpu::{consts::*, Gl, ImageDimensions};
use maskbool_wasm::shader::ShaderSources;
use maskbool_wasm::{
    Detection, FramePipeline, FrameScheduler, MaskEstimate, MaskSource, MaskSourceError,
    Operation, OperationSelector, PipelineError, StopHandle,
};

/// RGBA8 pixels standing in for a video frame or a mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn filled(width: u32, height: u32, texel: [u8; 4]) -> Self {
        Self::from_fn(width, height, |_, _| texel)
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

impl ImageDimensions for Image {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

pub const FOREGROUND: [u8; 4] = [255, 255, 255, 255];
pub const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderId(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramId(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexArrayId(pub usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    program: usize,
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformValue {
    Int(i32),
    Uint(u32),
}

#[derive(Debug, Clone, Default)]
pub struct TextureState {
    pub params: HashMap<u32, i32>,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Number of `tex_image_from` uploads.
    pub uploads: usize,
    pub deleted: bool,
}

impl TextureState {
    fn sample(&self, x: u32, y: u32, width: u32, height: u32) -> [u8; 4] {
        if self.width == 0 || self.height == 0 || self.pixels.is_empty() {
            return [0, 0, 0, 0];
        }
        let sx = (x * self.width / width).min(self.width - 1);
        let sy = (y * self.height / height).min(self.height - 1);
        let i = ((sy * self.width + sx) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ShaderState {
    pub stage: u32,
    pub source: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProgramState {
    pub shaders: Vec<usize>,
    pub source: String,
    pub linked: bool,
    pub deleted: bool,
    pub uniforms: HashMap<String, UniformValue>,
}

impl ProgramState {
    pub fn is_boolean(&self) -> bool {
        self.source.contains("uOperation")
    }
}

#[derive(Debug, Clone)]
pub struct DrawCall {
    pub program: usize,
    pub framebuffer: Option<FramebufferId>,
    pub vertex_array: Option<VertexArrayId>,
    pub mode: u32,
    pub count: i32,
    pub element_type: u32,
    pub uniforms: HashMap<String, UniformValue>,
    pub units: HashMap<u32, TextureId>,
}

impl DrawCall {
    pub fn is_offscreen(&self) -> bool {
        self.framebuffer.is_some()
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }
}

#[derive(Debug, Default)]
pub struct State {
    pub textures: Vec<TextureState>,
    pub framebuffers: Vec<Option<TextureId>>,
    pub deleted_framebuffers: Vec<FramebufferId>,
    pub shaders: Vec<ShaderState>,
    pub programs: Vec<ProgramState>,
    pub vertex_arrays: usize,
    pub buffers: Vec<Vec<u8>>,
    pub active_unit: u32,
    pub units: HashMap<u32, TextureId>,
    pub bound_framebuffer: Option<FramebufferId>,
    pub bound_program: Option<usize>,
    pub bound_vertex_array: Option<VertexArrayId>,
    pub bound_buffers: HashMap<u32, BufferId>,
    pub enabled_attributes: Vec<u32>,
    pub attribute_pointers: Vec<(u32, i32, i32, i32)>,
    pub pixel_store: HashMap<u32, i32>,
    pub viewport: (i32, i32, i32, i32),
    pub draws: Vec<DrawCall>,
}

impl State {
    fn bound_texture(&self) -> usize {
        self.units
            .get(&self.active_unit)
            .expect("no texture bound to the active unit")
            .0
    }
}

pub struct RecordingGl {
    pub state: RefCell<State>,
    pub size: (i32, i32),
    /// Overrides every completeness check, e.g. `FRAMEBUFFER_UNSUPPORTED`.
    pub forced_status: Option<u32>,
}

impl RecordingGl {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            state: RefCell::new(State {
                active_unit: TEXTURE0,
                ..State::default()
            }),
            size: (width, height),
            forced_status: None,
        }
    }

    pub fn texture(&self, id: &TextureId) -> TextureState {
        self.state.borrow().textures[id.0].clone()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn offscreen_draws(&self) -> Vec<DrawCall> {
        self.draws().into_iter().filter(DrawCall::is_offscreen).collect()
    }

    pub fn onscreen_draws(&self) -> Vec<DrawCall> {
        self.draws().into_iter().filter(|d| !d.is_offscreen()).collect()
    }

    fn render_boolean(state: &mut State, draw: &DrawCall, target: TextureId) {
        let unit_texture = |name: &str| match draw.uniform(name) {
            Some(UniformValue::Int(unit)) => draw.units.get(&(TEXTURE0 + unit as u32)).copied(),
            _ => None,
        };
        let code = match draw.uniform("uOperation") {
            Some(UniformValue::Uint(code)) => Operation::ACTIVE
                .iter()
                .filter_map(|op| op.shader_code())
                .find(|active| active.get() == code)
                .expect("unknown operation code"),
            other => panic!("boolean pass drawn without an operation: {other:?}"),
        };
        let previous = unit_texture("uPreviousTexture").expect("previous texture unbound");
        let mask = unit_texture("uMaskTexture");
        assert_ne!(previous, target, "feedback loop: sampling the render target");
        assert_ne!(mask, Some(target), "feedback loop: sampling the render target");

        let (width, height) = {
            let t = &state.textures[target.0];
            (t.width, t.height)
        };
        let previous = state.textures[previous.0].clone();
        let mask = mask.map(|m| state.textures[m.0].clone()).unwrap_or_default();

        let mut out = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let p = previous.sample(x, y, width, height);
                let m = mask.sample(x, y, width, height);
                out.extend_from_slice(&code.shade(p, m));
            }
        }
        state.textures[target.0].pixels = out;
    }
}

impl Gl for RecordingGl {
    type Texture = TextureId;
    type Framebuffer = FramebufferId;
    type Shader = ShaderId;
    type Program = ProgramId;
    type UniformLocation = Location;
    type VertexArray = VertexArrayId;
    type Buffer = BufferId;
    type Image = Image;

    fn create_texture(&self) -> Option<TextureId> {
        let mut state = self.state.borrow_mut();
        state.textures.push(TextureState::default());
        Some(TextureId(state.textures.len() - 1))
    }

    fn delete_texture(&self, texture: &TextureId) {
        let mut state = self.state.borrow_mut();
        state.textures[texture.0].deleted = true;
        state.units.retain(|_, bound| bound != texture);
    }

    fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
    }

    fn bind_texture(&self, target: u32, texture: Option<&TextureId>) {
        assert_eq!(target, TEXTURE_2D);
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        match texture {
            Some(texture) => state.units.insert(unit, *texture),
            None => state.units.remove(&unit),
        };
    }

    fn tex_parameter_i32(&self, _target: u32, pname: u32, value: i32) {
        let mut state = self.state.borrow_mut();
        let texture = state.bound_texture();
        state.textures[texture].params.insert(pname, value);
    }

    fn pixel_store_i32(&self, pname: u32, value: i32) {
        self.state.borrow_mut().pixel_store.insert(pname, value);
    }

    fn tex_image_empty_rgba8(&self, width: i32, height: i32) -> Result<(), String> {
        if width < 0 || height < 0 {
            return Err("INVALID_VALUE: negative size".into());
        }
        let mut state = self.state.borrow_mut();
        let texture = state.bound_texture();
        let texture = &mut state.textures[texture];
        texture.width = width as u32;
        texture.height = height as u32;
        texture.pixels = vec![0; (width * height * 4) as usize];
        Ok(())
    }

    fn tex_image_from(&self, image: &Image) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let texture = state.bound_texture();
        let texture = &mut state.textures[texture];
        texture.width = image.width;
        texture.height = image.height;
        texture.pixels = image.pixels.clone();
        texture.uploads += 1;
        Ok(())
    }

    fn create_framebuffer(&self) -> Option<FramebufferId> {
        let mut state = self.state.borrow_mut();
        state.framebuffers.push(None);
        Some(FramebufferId(state.framebuffers.len() - 1))
    }

    fn delete_framebuffer(&self, framebuffer: &FramebufferId) {
        let mut state = self.state.borrow_mut();
        state.deleted_framebuffers.push(*framebuffer);
        if state.bound_framebuffer == Some(*framebuffer) {
            state.bound_framebuffer = None;
        }
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: Option<&FramebufferId>) {
        assert_eq!(target, FRAMEBUFFER);
        self.state.borrow_mut().bound_framebuffer = framebuffer.copied();
    }

    fn framebuffer_texture_2d(
        &self,
        _target: u32,
        attachment: u32,
        _tex_target: u32,
        texture: Option<&TextureId>,
    ) {
        assert_eq!(attachment, COLOR_ATTACHMENT0);
        let mut state = self.state.borrow_mut();
        let framebuffer = state.bound_framebuffer.expect("no framebuffer bound");
        state.framebuffers[framebuffer.0] = texture.copied();
    }

    fn check_framebuffer_status(&self, _target: u32) -> u32 {
        if let Some(status) = self.forced_status {
            return status;
        }
        let state = self.state.borrow();
        let Some(framebuffer) = state.bound_framebuffer else {
            return FRAMEBUFFER_COMPLETE;
        };
        match state.framebuffers[framebuffer.0] {
            None => FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT,
            Some(texture) => {
                let texture = &state.textures[texture.0];
                if texture.width == 0 || texture.height == 0 {
                    FRAMEBUFFER_INCOMPLETE_ATTACHMENT
                } else {
                    FRAMEBUFFER_COMPLETE
                }
            }
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = (x, y, width, height);
    }

    fn drawing_buffer_size(&self) -> (i32, i32) {
        self.size
    }

    fn create_shader(&self, stage: u32) -> Option<ShaderId> {
        let mut state = self.state.borrow_mut();
        state.shaders.push(ShaderState {
            stage,
            source: String::new(),
            deleted: false,
        });
        Some(ShaderId(state.shaders.len() - 1))
    }

    fn compile_shader(&self, shader: &ShaderId, source: &str) -> bool {
        self.state.borrow_mut().shaders[shader.0].source = source.to_owned();
        !source.contains("#error")
    }

    fn shader_info_log(&self, shader: &ShaderId) -> String {
        let state = self.state.borrow();
        let source = &state.shaders[shader.0].source;
        source
            .lines()
            .position(|line| line.contains("#error"))
            .map(|line| format!("ERROR: 0:{}: '#error' : user-defined error", line + 1))
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: &ShaderId) {
        self.state.borrow_mut().shaders[shader.0].deleted = true;
    }

    fn create_program(&self) -> Option<ProgramId> {
        let mut state = self.state.borrow_mut();
        state.programs.push(ProgramState::default());
        Some(ProgramId(state.programs.len() - 1))
    }

    fn attach_shader(&self, program: &ProgramId, shader: &ShaderId) {
        let mut state = self.state.borrow_mut();
        let source = state.shaders[shader.0].source.clone();
        let program = &mut state.programs[program.0];
        program.shaders.push(shader.0);
        program.source.push_str(&source);
    }

    fn link_program(&self, program: &ProgramId) -> bool {
        let mut state = self.state.borrow_mut();
        let program = &mut state.programs[program.0];
        program.linked = program.shaders.len() == 2 && !program.source.contains("LINK_ERROR");
        program.linked
    }

    fn program_info_log(&self, program: &ProgramId) -> String {
        if self.state.borrow().programs[program.0].linked {
            String::new()
        } else {
            "ERROR: Varyings with the same name but different type".into()
        }
    }

    fn delete_program(&self, program: &ProgramId) {
        self.state.borrow_mut().programs[program.0].deleted = true;
    }

    fn uniform_location(&self, program: &ProgramId, name: &str) -> Option<Location> {
        let state = self.state.borrow();
        let declared = state.programs[program.0]
            .source
            .lines()
            .any(|line| {
                line.trim_start().starts_with("uniform") && line.contains(&format!(" {name};"))
            });
        declared.then(|| Location {
            program: program.0,
            name: name.to_owned(),
        })
    }

    fn use_program(&self, program: Option<&ProgramId>) {
        self.state.borrow_mut().bound_program = program.map(|p| p.0);
    }

    fn uniform_1i32(&self, location: Option<&Location>, value: i32) {
        let Some(location) = location else { return };
        let mut state = self.state.borrow_mut();
        assert_eq!(
            state.bound_program,
            Some(location.program),
            "uniform set on an inactive program"
        );
        state.programs[location.program]
            .uniforms
            .insert(location.name.clone(), UniformValue::Int(value));
    }

    fn uniform_1u32(&self, location: Option<&Location>, value: u32) {
        let Some(location) = location else { return };
        let mut state = self.state.borrow_mut();
        assert_eq!(
            state.bound_program,
            Some(location.program),
            "uniform set on an inactive program"
        );
        state.programs[location.program]
            .uniforms
            .insert(location.name.clone(), UniformValue::Uint(value));
    }

    fn create_vertex_array(&self) -> Option<VertexArrayId> {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays += 1;
        Some(VertexArrayId(state.vertex_arrays - 1))
    }

    fn bind_vertex_array(&self, vertex_array: Option<&VertexArrayId>) {
        self.state.borrow_mut().bound_vertex_array = vertex_array.copied();
    }

    fn create_buffer(&self) -> Option<BufferId> {
        let mut state = self.state.borrow_mut();
        state.buffers.push(Vec::new());
        Some(BufferId(state.buffers.len() - 1))
    }

    fn bind_buffer(&self, target: u32, buffer: Option<&BufferId>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(buffer) => state.bound_buffers.insert(target, *buffer),
            None => state.bound_buffers.remove(&target),
        };
    }

    fn buffer_data_u8(&self, target: u32, data: &[u8], _usage: u32) {
        let mut state = self.state.borrow_mut();
        let buffer = *state.bound_buffers.get(&target).expect("no buffer bound");
        state.buffers[buffer.0] = data.to_vec();
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.state.borrow_mut().enabled_attributes.push(index);
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        self.state
            .borrow_mut()
            .attribute_pointers
            .push((index, size, stride, offset));
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, _offset: i32) {
        let mut state = self.state.borrow_mut();
        let program = state.bound_program.expect("draw without a program");
        let draw = DrawCall {
            program,
            framebuffer: state.bound_framebuffer,
            vertex_array: state.bound_vertex_array,
            mode,
            count,
            element_type,
            uniforms: state.programs[program].uniforms.clone(),
            units: state.units.clone(),
        };
        if let Some(framebuffer) = draw.framebuffer {
            let target = state.framebuffers[framebuffer.0].expect("framebuffer without attachment");
            if state.programs[program].is_boolean() {
                Self::render_boolean(&mut state, &draw, target);
            }
        }
        state.draws.push(draw);
    }
}

/// Mask source that replays scripted results, then reports nobody.
#[derive(Default)]
pub struct ScriptedMasks {
    pub responses: VecDeque<Result<MaskEstimate<Image>, MaskSourceError>>,
    pub calls: usize,
}

impl ScriptedMasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_person(self, mask: Image) -> Self {
        self.then_people(1, mask)
    }

    /// `people` detections, the first of which carries `mask`.
    pub fn then_people(mut self, people: usize, mask: Image) -> Self {
        self.responses
            .push_back(Ok(MaskEstimate::found(people, person(mask))));
        self
    }

    pub fn then_nobody(mut self) -> Self {
        self.responses.push_back(Ok(MaskEstimate::nobody()));
        self
    }

    pub fn then_error(mut self, message: &str) -> Self {
        self.responses
            .push_back(Err(MaskSourceError::Estimate(message.to_owned())));
        self
    }
}

impl MaskSource<Image> for ScriptedMasks {
    async fn estimate(&mut self, _frame: &Image) -> Result<MaskEstimate<Image>, MaskSourceError> {
        self.calls += 1;
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(MaskEstimate::nobody()))
    }
}

pub fn person(mask: Image) -> Detection<Image> {
    Detection {
        score: Some(0.9),
        mask,
    }
}

/// Fires `frames` callbacks, then raises the stop flag.
pub struct CountedFrames {
    pub remaining: usize,
    pub stop: StopHandle,
}

impl FrameScheduler for CountedFrames {
    async fn next_frame(&mut self) -> Result<(), PipelineError> {
        if self.remaining == 0 {
            self.stop.stop();
        } else {
            self.remaining -= 1;
        }
        Ok(())
    }
}

pub const WIDTH: i32 = 4;
pub const HEIGHT: i32 = 4;

pub fn video() -> Image {
    Image::filled(WIDTH as u32, HEIGHT as u32, [90, 120, 150, 255])
}

pub fn pipeline(initial: Operation) -> FramePipeline<RecordingGl> {
    FramePipeline::new(
        RecordingGl::new(WIDTH, HEIGHT),
        &ShaderSources::embedded(),
        OperationSelector::new(initial),
        &CompositorConfig::default(),
    )
    .expect("pipeline builds against the recorder")
}

/// Contents of the accumulator texture the display pass samples.
pub fn accumulated(pipeline: &FramePipeline<RecordingGl>) -> Vec<u8> {
    pipeline
        .gl()
        .texture(&pipeline.accumulator().write().texture)
        .pixels
}

/// Left half foreground, right half background.
pub fn left_half_mask() -> Image {
    Image::from_fn(WIDTH as u32, HEIGHT as u32, |x, _| {
        if x < WIDTH as u32 / 2 {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

/// Red channel of each texel.
pub fn reds(pixels: &[u8]) -> Vec<u8> {
    pixels.chunks(4).map(|texel| texel[0]).collect()
}
