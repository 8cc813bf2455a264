#[macro_use]
extern crate log;

use std::process;
use opengl_tutorials::config::Config;
use opengl_tutorials::keyboard::BlendControls;
use opengl_tutorials::meshes::{Mesh, VertexLayout};
use opengl_tutorials::renderer::Renderer;
use opengl_tutorials::shaders::ShaderProgram;
use opengl_tutorials::textures::Texture;
use opengl_tutorials::tutorials::{QUAD_CLEAR_COLOUR, QUAD_INDICES, QUAD_LAYOUT, QUAD_VERTICES};

fn main() {
    env_logger::init();

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config.with_title("Textures"),
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    info!("good day! drawing a textured quad");
    if let Err(e) = run(&config) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), String> {
    let mut renderer = Renderer::init(&config.window)?;

    let paths = &config.textures;
    let program = ShaderProgram::from_files(renderer.gl.clone(), &paths.vertex_shader, &paths.fragment_shader, &config.shaders)
        .map_err(|e| e.to_string())?;
    let quad = Mesh::new(&renderer.gl, &QUAD_VERTICES, Some(&QUAD_INDICES), &VertexLayout::new(&QUAD_LAYOUT))
        .map_err(|e| format!("failed to create quad: {}", e))?;

    // a missing image leaves its texture black, the quad is still drawn
    let textures: Vec<Texture> = [&paths.first_texture, &paths.second_texture].iter().map(|path| {
        Texture::new_from_path(&renderer.gl, path, paths.flip_vertically).unwrap_or_else(|e| {
            error!("failed to load texture: {}", e);
            Texture::empty(&renderer.gl)
        })
    }).collect();

    let mut controls = BlendControls::default();
    program.activate();
    program.set_int("texture1", 0);
    program.set_int("texture2", 1);

    let clear_colour = config.clear_colour.unwrap_or(QUAD_CLEAR_COLOUR);
    while !renderer.manage_window() {
        controls.apply_all(&renderer.pressed_keys());

        renderer.clear(clear_colour);
        for (unit, texture) in textures.iter().enumerate() {
            texture.bind(unit as u32);
        }

        program.activate();
        program.set_int("mult_amount", controls.mult);
        program.set_float("mix_amount", controls.mix);
        quad.draw();

        renderer.swap_buffers();
    }

    Ok(())
}
