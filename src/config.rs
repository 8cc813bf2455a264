use std::path::{Path, PathBuf};
use serde::Deserialize;
use crate::shaders::{ErrorPolicy, ShaderOptions};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "opengl tutorials".to_string(),
        }
    }
}

/// Files the textures tutorial loads.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub first_texture: PathBuf,
    pub second_texture: PathBuf,
    /// Images are stored top row first, GL samples bottom row first.
    pub flip_vertically: bool,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("shaders/textures.vert"),
            fragment_shader: PathBuf::from("shaders/textures.frag"),
            first_texture: PathBuf::from("assets/container.jpg"),
            second_texture: PathBuf::from("assets/awesomeface.png"),
            flip_vertically: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    /// `None` leaves the colour up to the tutorial.
    pub clear_colour: Option<[f32; 4]>,
    pub shaders: ShaderOptions,
    pub textures: TextureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_colour: None,
            shaders: ShaderOptions::default(),
            textures: TextureConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&contents).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Builds the config from command line arguments (program name already skipped).
    ///
    /// `--config <file>` is applied first wherever it appears, the other flags override it.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Config, String> {
        let args: Vec<String> = args.into_iter().collect();

        let mut config = match args.iter().position(|a| a == "--config") {
            Some(i) => {
                let path = args.get(i + 1).ok_or("expected a path after --config")?;
                info!("loading config from {}", path);
                Config::load(path)?
            }
            None => Config::default(),
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    args.next();
                }
                "--strict" => config.shaders.policy = ErrorPolicy::Strict,
                "--lenient" => config.shaders.policy = ErrorPolicy::Lenient,
                "--width" => config.window.width = parse_dimension(args.next(), "--width")?,
                "--height" => config.window.height = parse_dimension(args.next(), "--height")?,
                "--title" => {
                    config.window.title = args.next().ok_or("expected a title after --title")?;
                }
                _ => {
                    debug!("ignoring argument {}", arg);
                }
            }
        }

        Ok(config)
    }

    pub fn with_title(mut self, title: &str) -> Config {
        if self.window.title == WindowConfig::default().title {
            self.window.title = title.to_string();
        }
        self
    }
}

fn parse_dimension(value: Option<String>, flag: &str) -> Result<u32, String> {
    let value = value.ok_or(format!("expected a number after {}", flag))?;
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid value for {}: {}", flag, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_match_tutorial_window() {
        let config = Config::from_args(Vec::new()).unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.shaders.policy, ErrorPolicy::Lenient);
        assert_eq!(config.shaders.info_log_capacity, 512);
        assert!(config.textures.flip_vertically);
    }

    #[test]
    fn flags_override() {
        let config = Config::from_args(args(&["--strict", "--width", "1024", "--title", "quad", "--unknown"])).unwrap();
        assert_eq!(config.shaders.policy, ErrorPolicy::Strict);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.title, "quad");
    }

    #[test]
    fn bad_dimensions_are_rejected() {
        assert!(Config::from_args(args(&["--height"])).is_err());
        assert!(Config::from_args(args(&["--height", "0"])).is_err());
        assert!(Config::from_args(args(&["--width", "wide"])).is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{
            "window": { "title": "from json" },
            "clear_colour": [0.1, 0.2, 0.3, 1.0],
            "shaders": { "policy": "strict", "info_log_capacity": 1024 }
        }"#).unwrap();
        assert_eq!(config.window.title, "from json");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.clear_colour, Some([0.1, 0.2, 0.3, 1.0]));
        assert_eq!(config.shaders.info_log_capacity, 1024);
        assert_eq!(config.textures, TextureConfig::default());
    }

    #[test]
    fn config_file_then_flags() {
        let path = std::env::temp_dir().join(format!("opengl-tutorials-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "window": { "width": 320, "height": 240 }, "shaders": { "policy": "strict" } }"#).unwrap();

        let config = Config::from_args(args(&["--lenient", "--config", path.to_str().unwrap()])).unwrap();
        assert_eq!(config.window.width, 320);
        assert_eq!(config.shaders.policy, ErrorPolicy::Lenient);

        std::fs::remove_file(&path).unwrap();
        assert!(Config::from_args(args(&["--config", path.to_str().unwrap()])).is_err());
    }

    #[test]
    fn tutorial_title_only_replaces_default() {
        assert_eq!(Config::default().with_title("Textures").window.title, "Textures");
        let config = Config::from_args(args(&["--title", "mine"])).unwrap().with_title("Textures");
        assert_eq!(config.window.title, "mine");
    }
}
