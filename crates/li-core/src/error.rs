use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    OutOfBounds,
    InvalidStride,
    InvalidInput(&'static str),
    InvalidConfig { field: &'static str, reason: String },
    UnsupportedBitDepth(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::InvalidStride => write!(f, "invalid stride"),
            Self::InvalidInput(what) => write!(f, "invalid input: {what}"),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid config field `{field}`: {reason}")
            }
            Self::UnsupportedBitDepth(bits) => {
                write!(f, "unsupported effective bit depth {bits} (expected 8/10/12/14/16)")
            }
        }
    }
}

impl std::error::Error for Error {}
