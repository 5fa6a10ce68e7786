//! Shader program compilation and uniform caching.

use std::collections::HashMap;

use log::{debug, error};

use crate::error::GpuError;
use crate::gpu::{Gl, ShaderStage};
use crate::shader::ShaderSources;

/// Uniforms read by `boolean.frag.glsl`.
pub const U_PREVIOUS_TEXTURE: &str = "uPreviousTexture";
pub const U_MASK_TEXTURE: &str = "uMaskTexture";
pub const U_OPERATION: &str = "uOperation";

/// Uniforms read by `display.frag.glsl`.
pub const U_WEBCAM_TEXTURE: &str = "uWebcamTexture";
pub const U_BOOLEAN_TEXTURE: &str = "uBooleanTexture";

const BOOLEAN_UNIFORMS: [&str; 3] = [U_PREVIOUS_TEXTURE, U_MASK_TEXTURE, U_OPERATION];
const DISPLAY_UNIFORMS: [&str; 3] = [U_WEBCAM_TEXTURE, U_MASK_TEXTURE, U_BOOLEAN_TEXTURE];

/// A linked program and the uniform locations resolved right after linking.
pub struct Program<G: Gl> {
    program: G::Program,
    uniforms: HashMap<&'static str, G::UniformLocation>,
}

impl<G: Gl> Program<G> {
    /// Compiles both stages, links them and resolves `uniform_names`.
    ///
    /// Uniforms the driver does not report (unused or optimised away) are left
    /// unbound; setting them later is a no-op.
    pub fn load(
        gl: &G,
        vertex_source: &str,
        fragment_source: &str,
        uniform_names: &[&'static str],
    ) -> Result<Self, GpuError> {
        let vertex = compile(gl, ShaderStage::Vertex, vertex_source)?;
        let fragment = match compile(gl, ShaderStage::Fragment, fragment_source) {
            Ok(shader) => shader,
            Err(err) => {
                gl.delete_shader(&vertex);
                return Err(err);
            }
        };

        let linked = link(gl, &vertex, &fragment);
        // A linked program keeps its own copy of the binaries.
        gl.delete_shader(&vertex);
        gl.delete_shader(&fragment);
        let program = linked?;

        let mut uniforms = HashMap::with_capacity(uniform_names.len());
        for &name in uniform_names {
            match gl.uniform_location(&program, name) {
                Some(location) => {
                    uniforms.insert(name, location);
                }
                None => debug!("uniform {name} has no location; leaving it unbound"),
            }
        }

        Ok(Self { program, uniforms })
    }

    pub fn uniform(&self, name: &str) -> Option<&G::UniformLocation> {
        self.uniforms.get(name)
    }

    pub fn activate(&self, gl: &G) {
        gl.use_program(Some(&self.program));
    }

    /// Points a sampler uniform at a texture unit index.
    pub fn set_sampler(&self, gl: &G, name: &str, unit: u32) {
        gl.uniform_1i32(self.uniform(name), unit as i32);
    }

    pub fn set_u32(&self, gl: &G, name: &str, value: u32) {
        gl.uniform_1u32(self.uniform(name), value);
    }
}

fn compile<G: Gl>(gl: &G, stage: ShaderStage, source: &str) -> Result<G::Shader, GpuError> {
    let shader = gl
        .create_shader(stage.gl_enum())
        .ok_or(GpuError::Create("shader"))?;
    if gl.compile_shader(&shader, source) {
        return Ok(shader);
    }
    let log = gl.shader_info_log(&shader);
    error!("shader compilation error ({stage}): {log}");
    gl.delete_shader(&shader);
    Err(GpuError::ShaderCompile { stage, log })
}

fn link<G: Gl>(gl: &G, vertex: &G::Shader, fragment: &G::Shader) -> Result<G::Program, GpuError> {
    let program = gl.create_program().ok_or(GpuError::Create("program"))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    if gl.link_program(&program) {
        return Ok(program);
    }
    let log = gl.program_info_log(&program);
    error!("program linking error: {log}");
    gl.delete_program(&program);
    Err(GpuError::ProgramLink { log })
}

/// The two programs the frame pipeline draws with. Both share the pass-through
/// vertex stage.
pub struct ProgramCache<G: Gl> {
    pub boolean: Program<G>,
    pub display: Program<G>,
}

impl<G: Gl> ProgramCache<G> {
    pub fn build(gl: &G, sources: &ShaderSources) -> Result<Self, GpuError> {
        let boolean = Program::load(gl, &sources.vertex, &sources.boolean, &BOOLEAN_UNIFORMS)?;
        let display = Program::load(gl, &sources.vertex, &sources.display, &DISPLAY_UNIFORMS)?;
        Ok(Self { boolean, display })
    }
}
