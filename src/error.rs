use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The spatial block of a covariance cannot be inverted or decomposed.
    #[error("degenerate spatial filter (spatial block determinant {determinant:e})")]
    DegenerateFilter { determinant: f64 },

    #[error("unable to export image to {path}: {source}")]
    Export {
        path: String,
        #[source]
        source: exr::error::Error,
    },

    #[error("invalid command line: {0}")]
    Config(String),
}

impl From<getopts::Fail> for Error {
    fn from(f: getopts::Fail) -> Self {
        Error::Config(f.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
