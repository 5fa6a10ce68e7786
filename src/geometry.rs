//! The full-screen quad every pass draws.

use crate::error::GpuError;
use crate::gpu::{consts::*, Gl};

/// Corners in normalized device coordinates: bottom-left, bottom-right, top-left, top-right.
pub const QUAD_POSITIONS: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// Two counter-clockwise triangles over [`QUAD_POSITIONS`].
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Attribute location of `aPosition` in `basic.vert.glsl`.
pub const POSITION_ATTRIBUTE: u32 = 0;

pub struct FullScreenQuad<G: Gl> {
    vertex_array: G::VertexArray,
    // Owned so they live as long as the vertex array referencing them.
    _positions: G::Buffer,
    _indices: G::Buffer,
}

impl<G: Gl> FullScreenQuad<G> {
    pub fn new(gl: &G) -> Result<Self, GpuError> {
        let vertex_array = gl
            .create_vertex_array()
            .ok_or(GpuError::Create("vertex array"))?;
        gl.bind_vertex_array(Some(&vertex_array));

        let positions = gl.create_buffer().ok_or(GpuError::Create("vertex buffer"))?;
        gl.bind_buffer(ARRAY_BUFFER, Some(&positions));
        gl.buffer_data_u8(ARRAY_BUFFER, bytemuck::cast_slice(&QUAD_POSITIONS), STATIC_DRAW);
        gl.enable_vertex_attrib_array(POSITION_ATTRIBUTE);
        gl.vertex_attrib_pointer_f32(POSITION_ATTRIBUTE, 2, 0, 0);

        let indices = gl.create_buffer().ok_or(GpuError::Create("index buffer"))?;
        gl.bind_buffer(ELEMENT_ARRAY_BUFFER, Some(&indices));
        gl.buffer_data_u8(
            ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(&QUAD_INDICES),
            STATIC_DRAW,
        );

        gl.bind_vertex_array(None);

        Ok(Self {
            vertex_array,
            _positions: positions,
            _indices: indices,
        })
    }

    /// Binds the quad and draws its six indices as triangles.
    pub fn draw(&self, gl: &G) {
        gl.bind_vertex_array(Some(&self.vertex_array));
        gl.draw_elements(TRIANGLES, QUAD_INDICES.len() as i32, UNSIGNED_SHORT, 0);
    }
}
