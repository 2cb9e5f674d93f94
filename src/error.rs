use std::fmt;
use std::io;
use std::path::PathBuf;

// Deriving Debug is necessary to use .unwrap() in tests
#[derive(Debug)]
pub enum Error {
    IoError(io::Error),
    OpenFile(PathBuf, io::Error),
    TooSmallWindow(usize, usize),
    UnknownWindowSize,
    Logging(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            IoError(err) => write!(f, "{}", err),
            OpenFile(path, err) => write!(f, "Could not open {}: {}", path.display(), err),
            TooSmallWindow(w, h) => write!(
                f,
                "Screen {}x{} is too small. At least 1x3 is necessary in width x height",
                w, h
            ),
            UnknownWindowSize => write!(f, "Could not detect terminal window size"),
            Logging(msg) => write!(f, "Could not set up logging: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) | Error::OpenFile(_, err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
