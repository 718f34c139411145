use covtrace::config::{Command, Config};
use covtrace::example_scenes::{make_cornell_camera, make_cornell_spheres};
use covtrace::session::Session;
use log::*;

fn run() -> covtrace::Result<()> {
    let config = match Config::from_args(std::env::args().skip(1))? {
        Command::Run(config) => config,
        Command::Help(usage) => {
            print!("{}", usage);
            return Ok(());
        }
    };
    info!(
        "{} frame(s) at {}x{} on {} thread(s), pointer {:?}",
        config.frames, config.width, config.height, config.threads, config.pointer
    );

    let camera = make_cornell_camera(config.width, config.height);
    let mut session = Session::new(make_cornell_spheres(), camera, &config);
    for _ in 0..config.frames {
        session.frame();
    }

    if config.print_trace {
        println!("{}", session.trace());
    }
    session.export(&config.output)
}

fn main() {
    // info and above unless RUST_LOG says otherwise
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
