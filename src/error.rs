use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Fatal errors. Anything that can be skipped while drawing is a [`DrawFault`].
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("no layout level can hold a segment of {length} symbols at offset {progress}")]
    Planning { progress: u64, length: u64 },

    #[error("cannot allocate a {width}x{height} canvas: {reason} (try a smaller base width)")]
    Resource {
        width: u64,
        height: u64,
        reason: String,
    },

    #[error("invalid layout configuration: {0}")]
    Config(String),

    #[error("genomes are not aligned: {0}")]
    Alignment(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayoutError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn alignment<S: Into<String>>(message: S) -> Self {
        Self::Alignment(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A write that fell outside the canvas, or text that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawFault {
    pub x: u64,
    pub y: u64,
    pub message: String,
}

impl DrawFault {
    pub fn new(x: u64, y: u64, message: impl Into<String>) -> Self {
        Self {
            x,
            y,
            message: message.into(),
        }
    }
}

impl fmt::Display for DrawFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ({}, {})", self.message, self.x, self.y)
    }
}
