//! Error type shared by every module of the crate.
use std::path::PathBuf;

use thiserror::Error;

use crate::grid::Shape;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("raster error{}: {message}", location(.path, .line))]
    Raster {
        path: Option<PathBuf>,
        line: Option<usize>,
        message: String,
    },

    #[error("{what} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        what: String,
        expected: Shape,
        found: Shape,
    },

    #[error("the cell resolution must be provided when no raster is read from a file")]
    MissingResolution,

    #[error("variable `{name}` must be among {available:?}")]
    UnknownVariable {
        name: String,
        available: Vec<String>,
    },

    #[error(
        "time dimensions of climate datasets do not match: \
         precipitation has {precipitation} steps, temperature has {temperature}"
    )]
    TimeMismatch {
        precipitation: usize,
        temperature: usize,
    },

    #[error(
        "the heat index can only be computed for entire years, \
         got {months} months (not a multiple of 12)"
    )]
    IncompleteYear { months: usize },

    #[error("{name} = {value} is out of bounds [{min}, {max}]")]
    InvalidParameter {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("length mismatch: expected {expected}, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no simulation has been run yet")]
    NotSimulated,
}

pub type Result<T> = std::result::Result<T, StreamError>;

impl StreamError {
    pub(crate) fn raster(message: impl Into<String>) -> Self {
        StreamError::Raster {
            path: None,
            line: None,
            message: message.into(),
        }
    }

    pub(crate) fn shape(what: impl Into<String>, expected: Shape, found: Shape) -> Self {
        StreamError::ShapeMismatch {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Attach a file path to raster errors that lack one.
    pub(crate) fn with_path(self, p: &std::path::Path) -> Self {
        match self {
            StreamError::Raster {
                path: None,
                line,
                message,
            } => StreamError::Raster {
                path: Some(p.to_path_buf()),
                line,
                message,
            },
            other => other,
        }
    }
}

fn location(path: &Option<PathBuf>, line: &Option<usize>) -> String {
    match (path, line) {
        (Some(p), Some(l)) => format!(" in {}:{}", p.display(), l),
        (Some(p), None) => format!(" in {}", p.display()),
        (None, Some(l)) => format!(" at line {}", l),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_message_includes_location() {
        let err = StreamError::Raster {
            path: Some(PathBuf::from("dem.asc")),
            line: Some(4),
            message: "bad value".to_string(),
        };
        assert_eq!(err.to_string(), "raster error in dem.asc:4: bad value");
    }

    #[test]
    fn with_path_keeps_existing_path() {
        let err = StreamError::raster("oops").with_path(std::path::Path::new("a.asc"));
        assert_eq!(err.to_string(), "raster error in a.asc: oops");
        let err = err.with_path(std::path::Path::new("b.asc"));
        assert!(err.to_string().contains("a.asc"));
    }

    #[test]
    fn shape_mismatch_message() {
        let err = StreamError::shape("cropf", (3, 4), (2, 3));
        assert_eq!(err.to_string(), "cropf has shape (2, 3), expected (3, 4)");
    }
}
