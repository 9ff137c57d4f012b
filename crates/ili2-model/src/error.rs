// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for transfer container operations

use thiserror::Error;

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening, reading or writing a transfer
///
/// A probe mismatch is not an error: probing opens return `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    /// Source or destination file cannot be opened
    #[error("Failed to open transfer file `{path}`: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Write requested without a model file in the destination address
    #[error("Model file not specified in destination filename `{0}`")]
    ModelNotSpecified(String),

    /// The transfer reader could not be instantiated
    #[error("File {0} appears to be an INTERLIS 2 transfer but the transfer reader cannot be instantiated")]
    ReaderUnavailable(String),

    /// The model file could not be interpreted
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The transfer body could not be interpreted
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),

    /// Feature write attempted on a container that is not writable
    #[error("Container `{0}` is not open for writing")]
    NotWritable(String),

    /// Layer index out of range
    #[error("Layer {0} not found")]
    LayerNotFound(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an open failure for `path`
    pub fn open_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::OpenFailed {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid model error
    pub fn invalid_model(msg: impl Into<String>) -> Self {
        Error::InvalidModel(msg.into())
    }

    /// Create an invalid transfer error
    pub fn invalid_transfer(msg: impl Into<String>) -> Self {
        Error::InvalidTransfer(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error comes from caller configuration rather than I/O
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::ModelNotSpecified(_) | Error::ReaderUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        assert!(Error::ModelNotSpecified("out.xtf".into()).is_configuration());
        assert!(Error::ReaderUnavailable("in.xtf".into()).is_configuration());
        assert!(!Error::other("boom").is_configuration());
    }

    #[test]
    fn test_open_failed_message() {
        let err = Error::open_failed(
            "missing.xtf",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.contains("missing.xtf"));
        assert!(msg.contains("no such file"));
    }
}
