//! The slice of WebGL2 the compositor needs.
//!
//! Pipeline code is generic over [`Gl`] so it runs against the browser context in
//! production and against an in-memory recorder in host tests. Method names follow
//! the WebGL2 calls they forward to; enum arguments are raw GLenum values from
//! [`consts`].

use std::fmt;

/// Raw GLenum values used by the compositor. Identical to the WebGL2 constants.
pub mod consts {
    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE0: u32 = 0x84C0;
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;
    pub const LINEAR: u32 = 0x2601;
    pub const CLAMP_TO_EDGE: u32 = 0x812F;
    pub const RGBA: u32 = 0x1908;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const FLOAT: u32 = 0x1406;
    pub const UNPACK_FLIP_Y_WEBGL: u32 = 0x9240;

    pub const FRAMEBUFFER: u32 = 0x8D40;
    pub const COLOR_ATTACHMENT0: u32 = 0x8CE0;
    pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;
    pub const FRAMEBUFFER_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;
    pub const FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT: u32 = 0x8CD7;
    pub const FRAMEBUFFER_UNSUPPORTED: u32 = 0x8CDD;

    pub const VERTEX_SHADER: u32 = 0x8B31;
    pub const FRAGMENT_SHADER: u32 = 0x8B30;

    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;
    pub const STATIC_DRAW: u32 = 0x88E4;
    pub const TRIANGLES: u32 = 0x0004;
}

/// Which half of a program a shader belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => consts::VERTEX_SHADER,
            ShaderStage::Fragment => consts::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Reports the pixel size of anything that can be uploaded as a texture.
pub trait ImageDimensions {
    fn dimensions(&self) -> (u32, u32);
}

/// WebGL2 calls issued by the compositor.
///
/// `create_*` return `None` when the context refuses to allocate (typically a lost
/// context). Uniform setters accept `None` and ignore it, like WebGL does for a null
/// location.
pub trait Gl {
    type Texture: Clone + PartialEq + fmt::Debug;
    type Framebuffer: Clone + PartialEq + fmt::Debug;
    type Shader;
    type Program;
    type UniformLocation;
    type VertexArray;
    type Buffer;
    /// Anything `texImage2D` accepts as a source: video, canvas, bitmap, pixels.
    type Image: ImageDimensions;

    // -- Textures --

    fn create_texture(&self) -> Option<Self::Texture>;
    fn delete_texture(&self, texture: &Self::Texture);
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: u32, texture: Option<&Self::Texture>);
    fn tex_parameter_i32(&self, target: u32, pname: u32, value: i32);
    fn pixel_store_i32(&self, pname: u32, value: i32);

    /// `texImage2D(TEXTURE_2D, 0, RGBA, width, height, 0, RGBA, UNSIGNED_BYTE, null)`
    /// on the texture bound to the active unit.
    fn tex_image_empty_rgba8(&self, width: i32, height: i32) -> Result<(), String>;

    /// `texImage2D(TEXTURE_2D, 0, RGBA, RGBA, UNSIGNED_BYTE, image)` on the texture
    /// bound to the active unit.
    fn tex_image_from(&self, image: &Self::Image) -> Result<(), String>;

    // -- Framebuffers --

    fn create_framebuffer(&self) -> Option<Self::Framebuffer>;
    fn delete_framebuffer(&self, framebuffer: &Self::Framebuffer);
    fn bind_framebuffer(&self, target: u32, framebuffer: Option<&Self::Framebuffer>);
    fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        tex_target: u32,
        texture: Option<&Self::Texture>,
    );
    fn check_framebuffer_status(&self, target: u32) -> u32;
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn drawing_buffer_size(&self) -> (i32, i32);

    // -- Shaders and programs --

    fn create_shader(&self, stage: u32) -> Option<Self::Shader>;
    /// Sets the source and compiles; returns the compile status.
    fn compile_shader(&self, shader: &Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: &Self::Shader) -> String;
    fn delete_shader(&self, shader: &Self::Shader);

    fn create_program(&self) -> Option<Self::Program>;
    fn attach_shader(&self, program: &Self::Program, shader: &Self::Shader);
    /// Links and returns the link status.
    fn link_program(&self, program: &Self::Program) -> bool;
    fn program_info_log(&self, program: &Self::Program) -> String;
    fn delete_program(&self, program: &Self::Program);
    fn uniform_location(&self, program: &Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    fn use_program(&self, program: Option<&Self::Program>);
    fn uniform_1i32(&self, location: Option<&Self::UniformLocation>, value: i32);
    fn uniform_1u32(&self, location: Option<&Self::UniformLocation>, value: u32);

    // -- Geometry --

    fn create_vertex_array(&self) -> Option<Self::VertexArray>;
    fn bind_vertex_array(&self, vertex_array: Option<&Self::VertexArray>);
    fn create_buffer(&self) -> Option<Self::Buffer>;
    fn bind_buffer(&self, target: u32, buffer: Option<&Self::Buffer>);
    fn buffer_data_u8(&self, target: u32, data: &[u8], usage: u32);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32);
    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);
}
