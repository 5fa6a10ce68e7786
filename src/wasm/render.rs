use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, HtmlVideoElement, ImageBitmap, ImageData, WebGl2RenderingContext as GL,
    WebGlBuffer, WebGlFramebuffer, WebGlProgram, WebGlShader, WebGlTexture, WebGlUniformLocation,
    WebGlVertexArrayObject,
};

use super::describe;
use crate::error::InitError;
use crate::gpu::{Gl, ImageDimensions};

/// Texture sources the browser can upload directly.
#[derive(Debug, Clone)]
pub enum WebImage {
    Video(HtmlVideoElement),
    Canvas(HtmlCanvasElement),
    Bitmap(ImageBitmap),
    Pixels(ImageData),
}

impl WebImage {
    /// Classifies whatever `toCanvasImageSource()` resolved to. Hands the value
    /// back if it is not an uploadable image.
    pub fn from_js(value: JsValue) -> Result<Self, JsValue> {
        if value.is_instance_of::<ImageBitmap>() {
            Ok(WebImage::Bitmap(value.unchecked_into()))
        } else if value.is_instance_of::<HtmlCanvasElement>() {
            Ok(WebImage::Canvas(value.unchecked_into()))
        } else if value.is_instance_of::<ImageData>() {
            Ok(WebImage::Pixels(value.unchecked_into()))
        } else if value.is_instance_of::<HtmlVideoElement>() {
            Ok(WebImage::Video(value.unchecked_into()))
        } else {
            Err(value)
        }
    }
}

impl ImageDimensions for WebImage {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            WebImage::Video(video) => (video.video_width(), video.video_height()),
            WebImage::Canvas(canvas) => (canvas.width(), canvas.height()),
            WebImage::Bitmap(bitmap) => (bitmap.width(), bitmap.height()),
            WebImage::Pixels(pixels) => (pixels.width(), pixels.height()),
        }
    }
}

/// A WebGL2 context on a page canvas.
pub struct WebGl {
    gl: GL,
}

impl WebGl {
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Result<Self, InitError> {
        let gl: GL = canvas
            .get_context("webgl2")
            .ok()
            .flatten()
            .and_then(|context| context.dyn_into().ok())
            .ok_or(InitError::MissingCapability("WebGL 2"))?;
        Ok(Self { gl })
    }

    pub fn context(&self) -> &GL {
        &self.gl
    }
}

impl Gl for WebGl {
    type Texture = WebGlTexture;
    type Framebuffer = WebGlFramebuffer;
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type UniformLocation = WebGlUniformLocation;
    type VertexArray = WebGlVertexArrayObject;
    type Buffer = WebGlBuffer;
    type Image = WebImage;

    fn create_texture(&self) -> Option<WebGlTexture> {
        self.gl.create_texture()
    }

    fn delete_texture(&self, texture: &WebGlTexture) {
        self.gl.delete_texture(Some(texture));
    }

    fn active_texture(&self, unit: u32) {
        self.gl.active_texture(unit);
    }

    fn bind_texture(&self, target: u32, texture: Option<&WebGlTexture>) {
        self.gl.bind_texture(target, texture);
    }

    fn tex_parameter_i32(&self, target: u32, pname: u32, value: i32) {
        self.gl.tex_parameteri(target, pname, value);
    }

    fn pixel_store_i32(&self, pname: u32, value: i32) {
        self.gl.pixel_storei(pname, value);
    }

    fn tex_image_empty_rgba8(&self, width: i32, height: i32) -> Result<(), String> {
        self.gl
            .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                GL::TEXTURE_2D,
                0,
                GL::RGBA as i32,
                width,
                height,
                0,
                GL::RGBA,
                GL::UNSIGNED_BYTE,
                None,
            )
            .map_err(|err| describe(&err))
    }

    fn tex_image_from(&self, image: &WebImage) -> Result<(), String> {
        let (target, level, internal, format, kind) =
            (GL::TEXTURE_2D, 0, GL::RGBA as i32, GL::RGBA, GL::UNSIGNED_BYTE);
        let result = match image {
            WebImage::Video(video) => self
                .gl
                .tex_image_2d_with_u32_and_u32_and_html_video_element(
                    target, level, internal, format, kind, video,
                ),
            WebImage::Canvas(canvas) => self
                .gl
                .tex_image_2d_with_u32_and_u32_and_html_canvas_element(
                    target, level, internal, format, kind, canvas,
                ),
            WebImage::Bitmap(bitmap) => self.gl.tex_image_2d_with_u32_and_u32_and_image_bitmap(
                target, level, internal, format, kind, bitmap,
            ),
            WebImage::Pixels(pixels) => self.gl.tex_image_2d_with_u32_and_u32_and_image_data(
                target, level, internal, format, kind, pixels,
            ),
        };
        result.map_err(|err| describe(&err))
    }

    fn create_framebuffer(&self) -> Option<WebGlFramebuffer> {
        self.gl.create_framebuffer()
    }

    fn delete_framebuffer(&self, framebuffer: &WebGlFramebuffer) {
        self.gl.delete_framebuffer(Some(framebuffer));
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: Option<&WebGlFramebuffer>) {
        self.gl.bind_framebuffer(target, framebuffer);
    }

    fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        tex_target: u32,
        texture: Option<&WebGlTexture>,
    ) {
        self.gl
            .framebuffer_texture_2d(target, attachment, tex_target, texture, 0);
    }

    fn check_framebuffer_status(&self, target: u32) -> u32 {
        self.gl.check_framebuffer_status(target)
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.gl.viewport(x, y, width, height);
    }

    fn drawing_buffer_size(&self) -> (i32, i32) {
        (self.gl.drawing_buffer_width(), self.gl.drawing_buffer_height())
    }

    fn create_shader(&self, stage: u32) -> Option<WebGlShader> {
        self.gl.create_shader(stage)
    }

    fn compile_shader(&self, shader: &WebGlShader, source: &str) -> bool {
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);
        self.gl
            .get_shader_parameter(shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> String {
        self.gl.get_shader_info_log(shader).unwrap_or_default()
    }

    fn delete_shader(&self, shader: &WebGlShader) {
        self.gl.delete_shader(Some(shader));
    }

    fn create_program(&self) -> Option<WebGlProgram> {
        self.gl.create_program()
    }

    fn attach_shader(&self, program: &WebGlProgram, shader: &WebGlShader) {
        self.gl.attach_shader(program, shader);
    }

    fn link_program(&self, program: &WebGlProgram) -> bool {
        self.gl.link_program(program);
        self.gl
            .get_program_parameter(program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: &WebGlProgram) -> String {
        self.gl.get_program_info_log(program).unwrap_or_default()
    }

    fn delete_program(&self, program: &WebGlProgram) {
        self.gl.delete_program(Some(program));
    }

    fn uniform_location(&self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn use_program(&self, program: Option<&WebGlProgram>) {
        self.gl.use_program(program);
    }

    fn uniform_1i32(&self, location: Option<&WebGlUniformLocation>, value: i32) {
        self.gl.uniform1i(location, value);
    }

    fn uniform_1u32(&self, location: Option<&WebGlUniformLocation>, value: u32) {
        self.gl.uniform1ui(location, value);
    }

    fn create_vertex_array(&self) -> Option<WebGlVertexArrayObject> {
        self.gl.create_vertex_array()
    }

    fn bind_vertex_array(&self, vertex_array: Option<&WebGlVertexArrayObject>) {
        self.gl.bind_vertex_array(vertex_array);
    }

    fn create_buffer(&self) -> Option<WebGlBuffer> {
        self.gl.create_buffer()
    }

    fn bind_buffer(&self, target: u32, buffer: Option<&WebGlBuffer>) {
        self.gl.bind_buffer(target, buffer);
    }

    fn buffer_data_u8(&self, target: u32, data: &[u8], usage: u32) {
        self.gl.buffer_data_with_u8_array(target, data, usage);
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.gl.enable_vertex_attrib_array(index);
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        self.gl
            .vertex_attrib_pointer_with_i32(index, size, GL::FLOAT, false, stride, offset);
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        self.gl
            .draw_elements_with_i32(mode, count, element_type, offset);
    }
}
