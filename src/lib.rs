#[macro_use]
extern crate log;

pub mod backend;
pub mod config;
pub mod keyboard;
pub mod meshes;
#[cfg(feature = "graphical")]
pub mod renderer;
pub mod shaders;
pub mod textures;
pub mod tutorials;

pub use backend::{GlBackend, HeadlessBackend, ShaderBackend, ShaderStage};
pub use shaders::{ErrorPolicy, ProgramStatus, ShaderError, ShaderOptions, ShaderProgram, ShaderSource, UniformValue};
