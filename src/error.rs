use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    IoError(io::Error),
    Decode(&'static str, String),
    Encode(&'static str, String),
    SpanMismatch { expected: usize, actual: usize },
    UnsupportedType(String),
    LockError(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::Decode(field, msg) => write!(f, "Failed to decode {}: {}", field, msg),
            Error::Encode(field, msg) => write!(f, "Failed to encode {}: {}", field, msg),
            Error::SpanMismatch { expected, actual } => write!(
                f,
                "Span mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            Error::UnsupportedType(msg) => write!(f, "Unsupported type: {}", msg),
            Error::LockError(err) => write!(f, "Lock error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) | Error::LockError(err) => Some(err),
            _ => None,
        }
    }
}
