//! Shader programs: a vertex and a fragment stage compiled and linked into one program object.
//!
//! Construction reports every problem it meets (unreadable source, stage compile failure, link
//! failure) as a [`ShaderError`]. What happens next is up to the [`ErrorPolicy`]: the lenient
//! policy logs the error, remembers it in the program's [`ProgramStatus`] and keeps going, the
//! strict one hands it back to the caller.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use gl::types::{GLfloat, GLint, GLuint};
use serde::Deserialize;
use crate::backend::{ShaderBackend, ShaderStage, UNKNOWN_LOCATION};

pub const FILE_READ_TAG: &str = "ERROR::SHADER::FILE::FAILED_FILE_READ";
pub const VERTEX_COMPILE_TAG: &str = "ERROR::SHADER::VERTEX::COMPILATION_FAILED";
pub const FRAGMENT_COMPILE_TAG: &str = "ERROR::SHADER::FRAG::COMPILATION_FAILED";
pub const LINK_TAG: &str = "ERROR::SHADER::LINK::COMPILATION_FAILED";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShaderSource {
    Path(PathBuf),
    Text(String),
}

impl ShaderSource {
    pub fn path<P: AsRef<Path>>(path: P) -> ShaderSource {
        ShaderSource::Path(path.as_ref().to_path_buf())
    }

    pub fn text<S: Into<String>>(text: S) -> ShaderSource {
        ShaderSource::Text(text.into())
    }

    fn read(&self) -> Result<String, ShaderError> {
        match self {
            ShaderSource::Text(text) => Ok(text.clone()),
            ShaderSource::Path(path) => {
                info!("loading shader source: {}", path.display());
                fs::read_to_string(path).map_err(|e| ShaderError::FileRead {
                    path: path.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log, record in the status and keep building.
    #[default]
    Lenient,
    /// Stop at the first error and return it.
    Strict,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShaderOptions {
    pub policy: ErrorPolicy,
    /// Size of the buffer info logs are read into.
    pub info_log_capacity: usize,
}

impl Default for ShaderOptions {
    fn default() -> Self {
        Self {
            policy: ErrorPolicy::Lenient,
            info_log_capacity: 512,
        }
    }
}

impl ShaderOptions {
    pub fn strict() -> ShaderOptions {
        ShaderOptions {
            policy: ErrorPolicy::Strict,
            ..ShaderOptions::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShaderError {
    FileRead { path: PathBuf, reason: String },
    Compile { stage: ShaderStage, log: String },
    Link { log: String },
}

impl ShaderError {
    /// Stable prefix identifying what failed.
    pub fn tag(&self) -> &'static str {
        match self {
            ShaderError::FileRead { .. } => FILE_READ_TAG,
            ShaderError::Compile { stage: ShaderStage::Vertex, .. } => VERTEX_COMPILE_TAG,
            ShaderError::Compile { stage: ShaderStage::Fragment, .. } => FRAGMENT_COMPILE_TAG,
            ShaderError::Link { .. } => LINK_TAG,
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShaderError::FileRead { path, reason } => {
                write!(f, "{}\ncannot read {}: {}", self.tag(), path.display(), reason)
            }
            ShaderError::Compile { log, .. } | ShaderError::Link { log } => {
                write!(f, "{}\n{}", self.tag(), log)
            }
        }
    }
}

impl Error for ShaderError {}

/// What construction went through.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramStatus {
    pub linked: bool,
    /// Errors the lenient policy logged and carried on past, in the order they happened.
    pub diagnostics: Vec<ShaderError>,
}

impl ProgramStatus {
    pub fn is_ok(&self) -> bool {
        self.linked && self.diagnostics.is_empty()
    }

    pub fn has(&self, tag: &str) -> bool {
        self.diagnostics.iter().any(|d| d.tag() == tag)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Bool(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

struct Diagnostics {
    policy: ErrorPolicy,
    status: ProgramStatus,
}

impl Diagnostics {
    fn report(&mut self, error: ShaderError) -> Result<(), ShaderError> {
        match self.policy {
            ErrorPolicy::Strict => Err(error),
            ErrorPolicy::Lenient => {
                error!("{}", error);
                self.status.diagnostics.push(error);
                Ok(())
            }
        }
    }
}

/// A stage object that only lives for the duration of construction. It is detached from the
/// program it was attached to before being deleted.
struct StageObject<'a, B: ShaderBackend> {
    backend: &'a B,
    name: GLuint,
    program: Option<GLuint>,
}

impl<'a, B: ShaderBackend> StageObject<'a, B> {
    fn compile(backend: &'a B, stage: ShaderStage, source: &str, options: &ShaderOptions, diagnostics: &mut Diagnostics) -> Result<Self, ShaderError> {
        let object = StageObject {
            backend,
            name: backend.create_shader(stage),
            program: None,
        };
        backend.shader_source(object.name, source);
        backend.compile_shader(object.name);
        if !backend.compile_status(object.name) {
            let log = backend.shader_info_log(object.name, options.info_log_capacity);
            diagnostics.report(ShaderError::Compile { stage, log })?;
        }
        Ok(object)
    }

    fn attach(&mut self, program: GLuint) {
        self.backend.attach_shader(program, self.name);
        self.program = Some(program);
    }
}

impl<'a, B: ShaderBackend> Drop for StageObject<'a, B> {
    fn drop(&mut self) {
        if let Some(program) = self.program {
            self.backend.detach_shader(program, self.name);
        }
        self.backend.delete_shader(self.name);
    }
}

/// A linked (or at least link-attempted) program. The program object is deleted on drop.
pub struct ShaderProgram<B: ShaderBackend> {
    backend: Rc<B>,
    handle: GLuint,
    status: ProgramStatus,
}

impl<B: ShaderBackend> ShaderProgram<B> {
    pub fn new(backend: Rc<B>, vertex: ShaderSource, fragment: ShaderSource, options: &ShaderOptions) -> Result<ShaderProgram<B>, ShaderError> {
        let mut diagnostics = Diagnostics {
            policy: options.policy,
            status: ProgramStatus::default(),
        };

        // an unreadable stage is built from empty text
        let vertex_code = match vertex.read() {
            Ok(code) => code,
            Err(e) => {
                diagnostics.report(e)?;
                String::new()
            }
        };
        let fragment_code = match fragment.read() {
            Ok(code) => code,
            Err(e) => {
                diagnostics.report(e)?;
                String::new()
            }
        };

        let mut vs = StageObject::compile(&*backend, ShaderStage::Vertex, &vertex_code, options, &mut diagnostics)?;
        let mut fs = StageObject::compile(&*backend, ShaderStage::Fragment, &fragment_code, options, &mut diagnostics)?;

        let handle = backend.create_program();
        let mut program = ShaderProgram {
            backend: backend.clone(),
            handle,
            status: ProgramStatus::default(),
        };
        vs.attach(handle);
        fs.attach(handle);
        backend.link_program(handle);
        let linked = backend.link_status(handle);
        if !linked {
            let log = backend.program_info_log(handle, options.info_log_capacity);
            diagnostics.report(ShaderError::Link { log })?;
        }

        // the stages aren't needed once the link was attempted
        drop(vs);
        drop(fs);

        diagnostics.status.linked = linked;
        program.status = diagnostics.status;
        debug!("built shader program {} (linked: {})", handle, linked);
        Ok(program)
    }

    pub fn from_files<P: AsRef<Path>>(backend: Rc<B>, vertex_path: P, fragment_path: P, options: &ShaderOptions) -> Result<ShaderProgram<B>, ShaderError> {
        Self::new(backend, ShaderSource::path(vertex_path), ShaderSource::path(fragment_path), options)
    }

    pub fn from_source(backend: Rc<B>, vertex_source: &str, fragment_source: &str, options: &ShaderOptions) -> Result<ShaderProgram<B>, ShaderError> {
        Self::new(backend, ShaderSource::text(vertex_source), ShaderSource::text(fragment_source), options)
    }

    /// Makes this the program subsequent draw calls use.
    pub fn activate(&self) {
        self.backend.use_program(self.handle);
    }

    /// Assigns a uniform of this program. Takes effect on the current program, so activate first.
    /// Names the program doesn't declare are ignored.
    pub fn set_uniform<V: Into<UniformValue>>(&self, name: &str, value: V) {
        let location = self.backend.uniform_location(self.handle, name);
        if location == UNKNOWN_LOCATION {
            trace!("program {} has no uniform named {}", self.handle, name);
        }
        match value.into() {
            UniformValue::Bool(value) => self.backend.uniform_1i(location, value as GLint),
            UniformValue::Int(value) => self.backend.uniform_1i(location, value as GLint),
            UniformValue::Float(value) => self.backend.uniform_1f(location, value as GLfloat),
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, value);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    pub fn status(&self) -> &ProgramStatus {
        &self.status
    }

    pub fn is_linked(&self) -> bool {
        self.status.linked
    }

    pub fn handle(&self) -> GLuint {
        self.handle
    }
}

impl<B: ShaderBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        self.backend.delete_program(self.handle);
    }
}

impl<B: ShaderBackend> fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_stage() {
        let vertex = ShaderError::Compile { stage: ShaderStage::Vertex, log: "bad".to_string() };
        let fragment = ShaderError::Compile { stage: ShaderStage::Fragment, log: "bad".to_string() };
        assert_eq!(vertex.tag(), VERTEX_COMPILE_TAG);
        assert_eq!(fragment.tag(), FRAGMENT_COMPILE_TAG);
        assert_eq!(ShaderError::Link { log: String::new() }.tag(), LINK_TAG);
        assert_eq!(vertex.to_string(), "ERROR::SHADER::VERTEX::COMPILATION_FAILED\nbad");
    }

    #[test]
    fn file_read_error_names_path() {
        let err = ShaderSource::path("does/not/exist.glsl").read().unwrap_err();
        assert_eq!(err.tag(), FILE_READ_TAG);
        assert!(err.to_string().contains("does/not/exist.glsl"));
    }

    #[test]
    fn policy_deserialises_lowercase() {
        let options: ShaderOptions = serde_json::from_str(r#"{ "policy": "strict" }"#).unwrap();
        assert_eq!(options.policy, ErrorPolicy::Strict);
        assert_eq!(options.info_log_capacity, 512);
    }
}
