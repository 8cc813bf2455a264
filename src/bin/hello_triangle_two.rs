#[macro_use]
extern crate log;

use std::process;
use opengl_tutorials::config::Config;
use opengl_tutorials::tutorials;

fn main() {
    env_logger::init();

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config.with_title("Hello Triangles!"),
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    info!("good day! drawing two triangles");
    if let Err(e) = tutorials::run_triangles(&config, &tutorials::TWO_TRIANGLES_VERTICES) {
        error!("{}", e);
        process::exit(1);
    }
}
