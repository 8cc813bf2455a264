//! Shader sources and vertex data of the tutorial programs.

pub const TRIANGLE_VERTEX_SOURCE: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
   gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

pub const TRIANGLE_FRAGMENT_SOURCE: &str = "#version 330 core
out vec4 FragColor;
void main()
{
    FragColor = vec4(0.0f, 0.5f, 0.2f, 1.0f);
}
";

pub const TRIANGLE_CLEAR_COLOUR: [f32; 4] = [0.0, 0.05, 0.3, 1.0];
pub const QUAD_CLEAR_COLOUR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// One triangle in normalised device coordinates.
pub const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0,
    0.5, -0.5, 0.0,
    0.0, 0.5, 0.0,
];

/// Two triangles side by side, drawn from one buffer.
pub const TWO_TRIANGLES_VERTICES: [f32; 18] = [
    -1.0, -0.5, 0.0,
    0.0, -0.5, 0.0,
    -0.5, 0.5, 0.0,
    0.0, -0.5, 0.0,
    1.0, -0.5, 0.0,
    0.5, 0.5, 0.0,
];

/// Per-vertex position, colour and texture coordinates.
pub const QUAD_LAYOUT: [usize; 3] = [3, 3, 2];

pub const QUAD_VERTICES: [f32; 32] = [
    // positions      colours          uvs
    0.5, 0.5, 0.0,    1.0, 0.0, 0.0,   1.0, 1.0, // top right
    0.5, -0.5, 0.0,   0.0, 1.0, 0.0,   1.0, 0.0, // bottom right
    -0.5, -0.5, 0.0,  0.0, 0.0, 1.0,   0.0, 0.0, // bottom left
    -0.5, 0.5, 0.0,   1.0, 1.0, 0.0,   0.0, 1.0, // top left
];

pub const QUAD_INDICES: [u32; 6] = [
    0, 1, 3,
    1, 2, 3,
];

#[cfg(feature = "graphical")]
pub use self::graphical::run_triangles;

#[cfg(feature = "graphical")]
mod graphical {
    use crate::config::Config;
    use crate::meshes::{Mesh, VertexLayout};
    use crate::renderer::Renderer;
    use crate::shaders::ShaderProgram;
    use super::*;

    /// Draws `vertices` as plain green triangles until the window closes.
    pub fn run_triangles(config: &Config, vertices: &[f32]) -> Result<(), String> {
        let mut renderer = Renderer::init(&config.window)?;

        let program = ShaderProgram::from_source(renderer.gl.clone(), TRIANGLE_VERTEX_SOURCE, TRIANGLE_FRAGMENT_SOURCE, &config.shaders)
            .map_err(|e| e.to_string())?;
        let mesh = Mesh::new(&renderer.gl, vertices, None, &VertexLayout::new(&[3]))
            .map_err(|e| format!("failed to create mesh: {}", e))?;
        let clear_colour = config.clear_colour.unwrap_or(TRIANGLE_CLEAR_COLOUR);

        while !renderer.manage_window() {
            renderer.clear(clear_colour);
            program.activate();
            mesh.draw();
            renderer.swap_buffers();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshes::{validate, VertexLayout};

    #[test]
    fn vertex_data_fits_layouts() {
        let positions = VertexLayout::new(&[3]);
        assert_eq!(validate(&TRIANGLE_VERTICES, None, &positions), Ok(3));
        assert_eq!(validate(&TWO_TRIANGLES_VERTICES, None, &positions), Ok(6));
        assert_eq!(validate(&QUAD_VERTICES, Some(&QUAD_INDICES), &VertexLayout::new(&QUAD_LAYOUT)), Ok(6));
    }
}
