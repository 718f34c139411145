//! Command-line configuration of a headless run.

use crate::error::{Error, Result};
use crate::reconstruct::FilterMode;
use getopts::Options;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub width: usize,
    pub height: usize,
    /// Frames rendered before exporting.
    pub frames: usize,
    /// Indirect paths drawn per brute-force pass.
    pub samples: usize,
    pub threads: usize,
    pub seed: u64,
    /// Query pixel in normalized film coordinates.
    pub pointer: (f64, f64),
    /// Overrides the BRDF exponent of the second sphere.
    pub exponent: Option<f64>,
    pub max_depth: usize,
    pub mode: FilterMode,
    pub generate_background: bool,
    pub display_background: bool,
    pub generate_covariance: bool,
    pub generate_reference: bool,
    pub print_trace: bool,
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 512,
            height: 512,
            frames: 16,
            samples: 1000,
            threads: num_cpus::get(),
            seed: 0,
            pointer: (0.5, 0.5),
            exponent: None,
            max_depth: 1,
            mode: FilterMode::Gaussian,
            generate_background: true,
            display_background: true,
            generate_covariance: true,
            generate_reference: false,
            print_trace: false,
            output: "output.exr".to_string(),
        }
    }
}

/// What the command line asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Run(Config),
    Help(String),
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optopt("", "width", "film width in pixels", "N");
    opts.optopt("", "height", "film height in pixels", "N");
    opts.optopt("", "frames", "number of frames to render", "N");
    opts.optopt("", "samples", "indirect paths per brute-force pass", "N");
    opts.optopt("", "threads", "worker threads", "N");
    opts.optopt("", "seed", "base random seed", "N");
    opts.optopt("", "pointer", "query pixel in [0,1]^2", "X,Y");
    opts.optopt("", "exponent", "BRDF exponent of the second sphere", "E");
    opts.optopt("", "depth", "bounces before the filter is evaluated", "N");
    opts.optflag("", "polygonal", "show the polygonal footprint instead of the Gaussian");
    opts.optflag("", "no-background", "do not render the background image");
    opts.optflag("", "hide-background", "leave the background out of the export");
    opts.optflag("", "no-covariance", "do not render the analytic filter");
    opts.optflag("", "brute-force", "render the brute-force filter (slow)");
    opts.optflag("", "trace", "print the covariance tracing steps");
    opts.optopt("o", "output", "OpenEXR file to write", "FILE");
    opts.optflag("h", "help", "print this help");
    opts
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for --{}: {}", name, value)))
}

fn parse_pointer(value: &str) -> Result<(f64, f64)> {
    let mut parts = value.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) => {
            let pointer = (parse_value("pointer", x)?, parse_value("pointer", y)?);
            let inside = |v: f64| (0.0..=1.0).contains(&v);
            if inside(pointer.0) && inside(pointer.1) {
                Ok(pointer)
            } else {
                Err(Error::Config(format!("pointer outside [0,1]^2: {}", value)))
            }
        }
        _ => Err(Error::Config(format!("expected --pointer X,Y, got {}", value))),
    }
}

impl Config {
    /// Parses the arguments following the program name.
    pub fn from_args<I, S>(args: I) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let opts = options();
        let matches = opts.parse(args)?;
        if matches.opt_present("help") {
            return Ok(Command::Help(opts.usage("Usage: covtrace [options]")));
        }
        if let Some(extra) = matches.free.first() {
            return Err(Error::Config(format!("unexpected argument: {}", extra)));
        }

        let mut config = Config::default();
        let set_count = |name: &str, target: &mut usize| -> Result<()> {
            if let Some(v) = matches.opt_str(name) {
                *target = parse_value(name, &v)?;
            }
            Ok(())
        };
        set_count("width", &mut config.width)?;
        set_count("height", &mut config.height)?;
        set_count("frames", &mut config.frames)?;
        set_count("samples", &mut config.samples)?;
        set_count("threads", &mut config.threads)?;
        set_count("depth", &mut config.max_depth)?;

        if let Some(v) = matches.opt_str("seed") {
            config.seed = parse_value("seed", &v)?;
        }
        if let Some(v) = matches.opt_str("pointer") {
            config.pointer = parse_pointer(&v)?;
        }
        if let Some(v) = matches.opt_str("exponent") {
            let exponent: f64 = parse_value("exponent", &v)?;
            if !(exponent >= 1.0) {
                return Err(Error::Config(format!("exponent must be >= 1: {}", v)));
            }
            config.exponent = Some(exponent);
        }
        if let Some(v) = matches.opt_str("output") {
            config.output = v;
        }
        if matches.opt_present("polygonal") {
            config.mode = FilterMode::Polygonal;
        }
        config.generate_background = !matches.opt_present("no-background");
        config.display_background = !matches.opt_present("hide-background");
        config.generate_covariance = !matches.opt_present("no-covariance");
        config.generate_reference = matches.opt_present("brute-force");
        config.print_trace = matches.opt_present("trace");

        if config.width == 0 || config.height == 0 {
            return Err(Error::Config("film size must be positive".to_string()));
        }
        if config.threads == 0 {
            return Err(Error::Config("at least one thread is required".to_string()));
        }
        Ok(Command::Run(config))
    }
}
