//! The graphics capability a `ShaderProgram` is built on.
//!
//! Both backends mirror the OpenGL object model: integer names, status queries after compile and
//! link, info logs of bounded size, and uniform assignments that land on whichever program is
//! current. Locations follow GL conventions, `-1` meaning "no such uniform".

use std::fmt;
use gl::types::{GLfloat, GLint, GLuint};

pub mod headless;
pub mod opengl;

pub use headless::HeadlessBackend;
pub use opengl::GlBackend;

/// Location returned for names the linked program does not declare.
pub const UNKNOWN_LOCATION: GLint = -1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(&self) -> gl::types::GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader and program object operations of a graphics context.
///
/// Every method assumes the context is current on the calling thread. Backends are shared behind
/// an `Rc`, which keeps them (and every program holding one) on that thread.
pub trait ShaderBackend {
    fn create_shader(&self, stage: ShaderStage) -> GLuint;
    fn shader_source(&self, shader: GLuint, source: &str);
    fn compile_shader(&self, shader: GLuint);
    fn compile_status(&self, shader: GLuint) -> bool;
    /// At most `capacity - 1` bytes of the log, as `glGetShaderInfoLog` would write.
    fn shader_info_log(&self, shader: GLuint, capacity: usize) -> String;
    /// Deletion of a shader still attached to a program is deferred until it is detached.
    fn delete_shader(&self, shader: GLuint);

    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn detach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint);
    fn link_status(&self, program: GLuint) -> bool;
    fn program_info_log(&self, program: GLuint, capacity: usize) -> String;
    /// Deletion of the current program is deferred until another program is made current.
    fn delete_program(&self, program: GLuint);
    fn use_program(&self, program: GLuint);

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint;
    /// Assigns to `location` in the current program.
    fn uniform_1i(&self, location: GLint, value: GLint);
    /// Assigns to `location` in the current program.
    fn uniform_1f(&self, location: GLint, value: GLfloat);
}
