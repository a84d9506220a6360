//! Runtime faults.
//!
//! Distinct from compile diagnostics: a fault ends the current evaluation
//! and is returned to whoever started it.

use rasc_ir::ImageRole;

/// Result alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid world: {reason}")]
    InvalidWorld { reason: &'static str },

    #[error("no world is set and no bound image to derive one from")]
    NoWorld,

    #[error("`{name}` is not an image parameter of this script")]
    UnknownImage { name: String },

    #[error("image `{name}` is not a {expected} image")]
    WrongRole { name: String, expected: ImageRole },

    #[error("image `{name}` is not bound")]
    UnboundImage { name: String },

    #[error("`{name}` is not an image-scope variable of this script")]
    UnknownVariable { name: String },

    #[error("image-scope variable `{name}` has no value and no default")]
    UnsetVariable { name: String },

    /// `x` and `y` are the world position read; either may be null.
    #[error("read outside image `{image}` at ({x}, {y})")]
    OutsideImage { image: String, x: f64, y: f64 },

    #[error("band {band} of image `{image}` does not exist (image has {bands} bands)")]
    BandOutOfRange { image: String, band: f64, bands: u32 },

    #[error("`{func}` applied to lists of different lengths ({left} and {right})")]
    ListLengthMismatch {
        func: &'static str,
        left: usize,
        right: usize,
    },

    #[error("range {start}:{end} has more than {max} elements")]
    RangeTooLong { start: f64, end: f64, max: u64 },

    #[error("internal: {0}")]
    Internal(String),

    #[error("evaluation panicked: {message}")]
    Panicked { message: String },
}

impl RuntimeError {
    #[cold]
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        RuntimeError::Internal(message.into())
    }
}
