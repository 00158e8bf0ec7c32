// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Moviola.
#[derive(Debug)]
pub enum Error {
    /// An IO error occured while reading, writing, or seeking the stream.
    IoError(std::io::Error),
    /// The stream ended before a complete atom or field could be read.
    TruncatedFile,
    /// The stream contained malformed data and could not be parsed.
    DecodeError(&'static str),
    /// The sample table could not resolve the sample with the given index. This usually signals
    /// the end of a track, but may also indicate a corrupt sample table.
    InvalidSample(u64),
    /// More samples were requested in a single call than the audio ring buffer can hold.
    CapacityExceeded {
        /// The number of samples requested.
        requested: usize,
        /// The capacity of the ring buffer in samples.
        capacity: usize,
    },
    /// A buffer could not be allocated. The operation was abandoned and all prior state is
    /// unchanged.
    AllocationError(&'static str),
    /// An unsupported container or codec feature was encounted.
    Unsupported(&'static str),
    /// A default or user-defined limit was reached while reading or writing the stream.
    LimitError(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => err.fmt(f),
            Error::TruncatedFile => {
                write!(f, "truncated file: unexpected end of stream")
            }
            Error::DecodeError(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            Error::InvalidSample(sample) => {
                write!(f, "invalid sample: {} is not in the sample table", sample)
            }
            Error::CapacityExceeded { requested, capacity } => {
                write!(
                    f,
                    "capacity exceeded: requested {} samples, capacity is {}",
                    requested, capacity
                )
            }
            Error::AllocationError(what) => {
                write!(f, "allocation failed: {}", what)
            }
            Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            Error::LimitError(constraint) => {
                write!(f, "limit reached: {}", constraint)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedFile,
            _ => Error::IoError(err),
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Error {
        Error::AllocationError("buffer reservation failed")
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a decode error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::DecodeError(desc))
}

/// Convenience function to create a truncated file error.
pub fn truncated_error<T>() -> Result<T> {
    Err(Error::TruncatedFile)
}

/// Convenience function to create an invalid sample error.
pub fn invalid_sample_error<T>(sample: u64) -> Result<T> {
    Err(Error::InvalidSample(sample))
}

/// Convenience function to create a capacity exceeded error.
pub fn capacity_error<T>(requested: usize, capacity: usize) -> Result<T> {
    Err(Error::CapacityExceeded { requested, capacity })
}

/// Convenience function to create an unsupport feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Convenience function to create a limit error.
pub fn limit_error<T>(constraint: &'static str) -> Result<T> {
    Err(Error::LimitError(constraint))
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::Error;

    #[test]
    fn verify_eof_is_truncation() {
        let err = Error::from(io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream"));
        assert!(matches!(err, Error::TruncatedFile));

        let err = Error::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn verify_display() {
        let err = Error::CapacityExceeded { requested: 10, capacity: 4 };
        assert_eq!(err.to_string(), "capacity exceeded: requested 10 samples, capacity is 4");
        assert_eq!(
            Error::InvalidSample(7).to_string(),
            "invalid sample: 7 is not in the sample table"
        );
    }
}
