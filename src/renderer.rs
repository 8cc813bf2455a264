use std::rc::Rc;
use std::sync::mpsc::Receiver;
use glfw::{Action, Context, OpenGlProfileHint, WindowEvent, WindowHint, WindowMode};
use crate::backend::GlBackend;
use crate::config::WindowConfig;
use crate::keyboard::{glfw_key_to_key, key_to_glfw_key, TutorialKey, ALL_KEYS};

/// A glfw window with a current GL 3.3 core context.
pub struct Renderer {
    pub gl: Rc<GlBackend>,
    pub window: glfw::Window,
    pub events: Receiver<(f64, WindowEvent)>,
    pub glfw: glfw::Glfw,
}

impl Renderer {
    pub fn init(config: &WindowConfig) -> Result<Renderer, String> {
        let mut glfw = glfw::init(glfw::FAIL_ON_ERRORS).map_err(|e| format!("failed to initialise glfw: {:?}", e))?;
        glfw.window_hint(WindowHint::ContextVersion(3, 3));
        glfw.window_hint(WindowHint::OpenGlProfile(OpenGlProfileHint::Core));
        #[cfg(target_os = "macos")]
        glfw.window_hint(WindowHint::OpenGlForwardCompat(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, WindowMode::Windowed)
            .ok_or("failed to create glfw window")?;
        window.make_current();
        window.set_framebuffer_size_polling(true);
        window.set_key_polling(true);

        let gl = GlBackend::load_with(|symbol| window.get_proc_address(symbol) as *const _)?;
        unsafe {
            gl::Viewport(0, 0, config.width as i32, config.height as i32);
        }
        info!("created {}x{} window \"{}\"", config.width, config.height, config.title);

        Ok(Renderer {
            gl: Rc::new(gl),
            window,
            events,
            glfw,
        })
    }

    /// Pumps window events; returns true once the window should close.
    pub fn manage_window(&mut self) -> bool {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                WindowEvent::FramebufferSize(width, height) => unsafe {
                    debug!("framebuffer resized to {}x{}", width, height);
                    gl::Viewport(0, 0, width, height);
                },
                WindowEvent::Key(key, _, Action::Press, _) if glfw_key_to_key(key) == Some(TutorialKey::Escape) => {
                    self.window.set_should_close(true);
                }
                _ => {}
            }
        }
        self.window.should_close()
    }

    /// Tutorial keys currently held down.
    pub fn pressed_keys(&self) -> Vec<TutorialKey> {
        ALL_KEYS.iter()
            .copied()
            .filter(|key| self.window.get_key(key_to_glfw_key(*key)) == Action::Press)
            .collect()
    }

    pub fn clear(&self, colour: [f32; 4]) {
        unsafe {
            gl::ClearColor(colour[0], colour[1], colour[2], colour[3]);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }
}
