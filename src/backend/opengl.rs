use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use gl::types::*;
use crate::backend::{ShaderBackend, ShaderStage, UNKNOWN_LOCATION};

/// OpenGL through the function pointers loaded by `gl::load_with`.
///
/// Holding one is proof that the pointers were loaded; it is neither `Send` nor `Sync` since the
/// context it was loaded for is current on one thread only.
pub struct GlBackend {
    _not_send: PhantomData<*const ()>,
}

impl GlBackend {
    pub fn load_with<F>(loader: F) -> Result<GlBackend, String> where F: FnMut(&'static str) -> *const c_void {
        gl::load_with(loader);

        // the shader entry points are core since 2.0, missing ones mean the loader is broken
        if !gl::CreateShader::is_loaded() || !gl::CreateProgram::is_loaded() || !gl::Uniform1f::is_loaded() {
            return Err("failed to load opengl function pointers".to_string());
        }

        Ok(GlBackend {
            _not_send: PhantomData,
        })
    }
}

/// Buffer size for an info log: the log's reported length (terminator included), bounded by the
/// caller's capacity and by what a `GLsizei` can express.
fn info_log_buffer_size(capacity: usize, reported_length: GLint) -> usize {
    let length = usize::try_from(reported_length).unwrap_or(0);
    capacity.min(length).min(GLsizei::MAX as usize)
}

fn read_info_log(capacity: usize, reported_length: GLint, fetch: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    let size = info_log_buffer_size(capacity, reported_length);
    if size == 0 {
        return String::new();
    }
    let mut buf = vec![0u8; size];
    let mut written: GLsizei = 0;
    fetch(size as GLsizei, &mut written, buf.as_mut_ptr() as *mut GLchar);
    buf.truncate(usize::try_from(written).unwrap_or(0).min(size));
    String::from_utf8_lossy(&buf).into_owned()
}

impl ShaderBackend for GlBackend {
    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        unsafe { gl::CreateShader(stage.gl_enum()) }
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        // pass an explicit length so the source needs no trailing nul
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe {
            gl::ShaderSource(shader, 1, &ptr, &len);
        }
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) }
    }

    fn compile_status(&self, shader: GLuint) -> bool {
        let mut success: GLint = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
        }
        success == gl::TRUE as GLint
    }

    fn shader_info_log(&self, shader: GLuint, capacity: usize) -> String {
        let mut length: GLint = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut length);
        }
        read_info_log(capacity, length, |size, written, buf| unsafe {
            gl::GetShaderInfoLog(shader, size, written, buf);
        })
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) }
    }

    fn link_status(&self, program: GLuint) -> bool {
        let mut success: GLint = 0;
        unsafe {
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
        }
        success == gl::TRUE as GLint
    }

    fn program_info_log(&self, program: GLuint, capacity: usize) -> String {
        let mut length: GLint = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut length);
        }
        read_info_log(capacity, length, |size, written, buf| unsafe {
            gl::GetProgramInfoLog(program, size, written, buf);
        })
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
        // a name with an interior nul can't be declared in glsl anyway
        match CString::new(name) {
            Ok(name) => unsafe { gl::GetUniformLocation(program, name.as_ptr()) },
            Err(_) => UNKNOWN_LOCATION,
        }
    }

    fn uniform_1i(&self, location: GLint, value: GLint) {
        unsafe { gl::Uniform1i(location, value) }
    }

    fn uniform_1f(&self, location: GLint, value: GLfloat) {
        unsafe { gl::Uniform1f(location, value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_log_buffer_follows_reported_length() {
        assert_eq!(info_log_buffer_size(512, 40), 40);
        assert_eq!(info_log_buffer_size(16, 40), 16);
        assert_eq!(info_log_buffer_size(512, 0), 0);
        assert_eq!(info_log_buffer_size(512, -1), 0);
    }

    #[test]
    fn oversized_capacity_is_bounded() {
        assert_eq!(info_log_buffer_size(usize::MAX, 40), 40);
        assert_eq!(info_log_buffer_size(usize::MAX, GLint::MAX), GLsizei::MAX as usize);
        // would wrap to 0 as a GLsizei
        assert_eq!(info_log_buffer_size(1 << 32, 300), 300);
    }

    #[test]
    fn log_is_cut_at_written_length() {
        let log = read_info_log(usize::MAX, 6, |size, written, buf| {
            assert_eq!(size, 6);
            let text = b"error\0";
            unsafe {
                std::ptr::copy_nonoverlapping(text.as_ptr() as *const GLchar, buf, text.len());
                *written = 5;
            }
        });
        assert_eq!(log, "error");
        assert_eq!(read_info_log(512, 0, |_, _, _| panic!("nothing to fetch")), "");
    }
}
