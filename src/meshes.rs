use std::fmt;
use std::mem;
use std::ptr::null;
use gl::types::*;
use crate::backend::GlBackend;

const FLOAT_SIZE: usize = mem::size_of::<f32>();

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: GLuint,
    pub components: usize,
}

/// Interleaved float attributes, bound to locations 0, 1, 2...
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(components: &[usize]) -> VertexLayout {
        VertexLayout {
            attributes: components.iter().enumerate().map(|(i, c)| VertexAttribute {
                location: i as GLuint,
                components: *c,
            }).collect(),
        }
    }

    pub fn floats_per_vertex(&self) -> usize {
        self.attributes.iter().map(|a| a.components).sum()
    }

    pub fn stride(&self) -> usize {
        self.floats_per_vertex() * FLOAT_SIZE
    }

    /// Byte offset of each attribute within a vertex.
    pub fn offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        self.attributes.iter().map(|a| {
            let this = offset;
            offset += a.components * FLOAT_SIZE;
            this
        }).collect()
    }

    pub fn vertex_count(&self, vertices: &[f32]) -> Result<usize, MeshError> {
        let per_vertex = self.floats_per_vertex();
        if per_vertex == 0 {
            return Err(MeshError::EmptyLayout);
        }
        if let Some(attribute) = self.attributes.iter().find(|a| a.components == 0 || a.components > 4) {
            return Err(MeshError::InvalidComponents(attribute.components));
        }
        if vertices.len() % per_vertex != 0 {
            return Err(MeshError::RaggedVertices { floats: vertices.len(), per_vertex });
        }
        Ok(vertices.len() / per_vertex)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeshError {
    EmptyLayout,
    InvalidComponents(usize),
    RaggedVertices { floats: usize, per_vertex: usize },
    IndexOutOfRange { index: u32, vertices: usize },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MeshError::EmptyLayout => f.write_str("vertex layout has no attributes"),
            MeshError::InvalidComponents(n) => write!(f, "attributes have 1 to 4 components, not {}", n),
            MeshError::RaggedVertices { floats, per_vertex } => {
                write!(f, "{} floats is not a whole number of {}-float vertices", floats, per_vertex)
            }
            MeshError::IndexOutOfRange { index, vertices } => {
                write!(f, "index {} is out of range for {} vertices", index, vertices)
            }
        }
    }
}

impl std::error::Error for MeshError {}

/// Checks vertex data against a layout; returns how many elements a draw call covers.
pub fn validate(vertices: &[f32], indices: Option<&[u32]>, layout: &VertexLayout) -> Result<usize, MeshError> {
    let vertex_count = layout.vertex_count(vertices)?;
    match indices {
        Some(indices) => {
            if let Some(index) = indices.iter().find(|i| **i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange { index: *index, vertices: vertex_count });
            }
            Ok(indices.len())
        }
        None => Ok(vertex_count),
    }
}

/// A vertex array with its vertex buffer and optional element buffer.
pub struct Mesh {
    pub vao: GLuint,
    pub vbo: GLuint,
    pub ebo: Option<GLuint>,
    pub count: usize,
}

impl Mesh {
    pub fn new(_backend: &GlBackend, vertices: &[f32], indices: Option<&[u32]>, layout: &VertexLayout) -> Result<Mesh, MeshError> {
        let count = validate(vertices, indices, layout)?;

        let mut vao: GLuint = 0;
        let mut vbo: GLuint = 0;
        let mut ebo: Option<GLuint> = None;

        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::GenBuffers(1, &mut vbo);

            // buffer and attribute state set while the vao is bound is recorded in it
            gl::BindVertexArray(vao);

            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(gl::ARRAY_BUFFER, (vertices.len() * FLOAT_SIZE) as GLsizeiptr, vertices.as_ptr() as *const GLvoid, gl::STATIC_DRAW);

            if let Some(indices) = indices {
                let mut buffer: GLuint = 0;
                gl::GenBuffers(1, &mut buffer);
                gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, buffer);
                gl::BufferData(gl::ELEMENT_ARRAY_BUFFER, (indices.len() * mem::size_of::<u32>()) as GLsizeiptr, indices.as_ptr() as *const GLvoid, gl::STATIC_DRAW);
                ebo = Some(buffer);
            }

            let stride = layout.stride() as GLsizei;
            for (attribute, offset) in layout.attributes.iter().zip(layout.offsets()) {
                gl::VertexAttribPointer(attribute.location, attribute.components as GLint, gl::FLOAT, gl::FALSE, stride, offset as *const GLvoid);
                gl::EnableVertexAttribArray(attribute.location);
            }

            // unbinding the array buffer is fine, the vao keeps its own reference
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
            gl::BindVertexArray(0);
        }

        Ok(Mesh {
            vao,
            vbo,
            ebo,
            count,
        })
    }

    pub fn draw(&self) {
        unsafe {
            gl::BindVertexArray(self.vao);
            match self.ebo {
                Some(_) => gl::DrawElements(gl::TRIANGLES, self.count as GLsizei, gl::UNSIGNED_INT, null()),
                None => gl::DrawArrays(gl::TRIANGLES, 0, self.count as GLsizei),
            }
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteBuffers(1, &self.vbo);
            if let Some(ebo) = self.ebo {
                gl::DeleteBuffers(1, &ebo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_layout() {
        let layout = VertexLayout::new(&[3, 3, 2]);
        assert_eq!(layout.floats_per_vertex(), 8);
        assert_eq!(layout.stride(), 32);
        assert_eq!(layout.offsets(), vec![0, 12, 24]);
        assert_eq!(layout.attributes[2], VertexAttribute { location: 2, components: 2 });
    }

    #[test]
    fn counts_arrays_and_elements() {
        let positions = VertexLayout::new(&[3]);
        assert_eq!(validate(&[0.0; 18], None, &positions), Ok(6));
        assert_eq!(validate(&[0.0; 12], Some(&[0, 1, 3, 1, 2, 3]), &positions), Ok(6));
    }

    #[test]
    fn rejects_bad_data() {
        let positions = VertexLayout::new(&[3]);
        assert_eq!(validate(&[0.0; 10], None, &positions), Err(MeshError::RaggedVertices { floats: 10, per_vertex: 3 }));
        assert_eq!(validate(&[0.0; 9], Some(&[0, 3]), &positions), Err(MeshError::IndexOutOfRange { index: 3, vertices: 3 }));
        assert_eq!(validate(&[0.0; 9], None, &VertexLayout::new(&[])), Err(MeshError::EmptyLayout));
        assert_eq!(validate(&[0.0; 10], None, &VertexLayout::new(&[3, 0])), Err(MeshError::InvalidComponents(0)));
    }
}
