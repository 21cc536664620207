//! Tape Sources
//!
//! A `TapeSource` hands out one physical record per call. Backends:
//! the Linux st driver (`device`) and an existing image (`replay`).

pub mod device;
pub mod drive_types;
pub mod replay;

pub use device::TapeDevice;
pub use drive_types::DriveType;
pub use replay::ImageSource;

use std::fmt;
use std::io;

/// POSIX I/O error
pub const EIO: i32 = 5;
/// POSIX out of memory, what the st driver reports for an undersized buffer
pub const ENOMEM: i32 = 12;

/// Result of one physical read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome<'a> {
    /// A record, borrowed from the caller's buffer
    Data(&'a [u8]),
    TapeMark,
    /// OS-level error code
    Error(i32),
}

impl<'a> ReadOutcome<'a> {
    /// Classify the result of a `read(2)`-style call into `buffer`
    pub fn from_read(buffer: &'a [u8], result: io::Result<usize>) -> Self {
        match result {
            Ok(0) => ReadOutcome::TapeMark,
            Ok(n) => ReadOutcome::Data(&buffer[..n.min(buffer.len())]),
            Err(e) => ReadOutcome::Error(e.raw_os_error().unwrap_or(EIO)),
        }
    }
}

impl fmt::Display for ReadOutcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadOutcome::Data(data) => write!(f, "Record: {} frames", data.len()),
            ReadOutcome::TapeMark => write!(f, "Tape mark"),
            ReadOutcome::Error(code) => write!(f, "Read error: {}", error_message(*code)),
        }
    }
}

/// Human-readable message for an OS error code
pub fn error_message(code: i32) -> String {
    io::Error::from_raw_os_error(code).to_string()
}

/// Blocking, sequential source of physical tape records
pub trait TapeSource {
    /// Read the next physical record into `buffer`
    fn read_next<'a>(&mut self, buffer: &'a mut [u8]) -> ReadOutcome<'a>;

    /// Drive model, if the backend can tell
    fn drive_name(&self) -> Option<String> {
        None
    }
}

impl<T: TapeSource + ?Sized> TapeSource for Box<T> {
    fn read_next<'a>(&mut self, buffer: &'a mut [u8]) -> ReadOutcome<'a> {
        (**self).read_next(buffer)
    }

    fn drive_name(&self) -> Option<String> {
        (**self).drive_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_read_classification() {
        let buffer = [1u8, 2, 3, 4];
        assert_eq!(ReadOutcome::from_read(&buffer, Ok(0)), ReadOutcome::TapeMark);
        assert_eq!(
            ReadOutcome::from_read(&buffer, Ok(3)),
            ReadOutcome::Data(&[1, 2, 3])
        );
        assert_eq!(
            ReadOutcome::from_read(&buffer, Err(io::Error::from_raw_os_error(ENOMEM))),
            ReadOutcome::Error(ENOMEM)
        );
        assert_eq!(
            ReadOutcome::from_read(&buffer, Err(io::Error::new(io::ErrorKind::Other, "x"))),
            ReadOutcome::Error(EIO)
        );
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ReadOutcome::Data(b"abc").to_string(), "Record: 3 frames");
        assert_eq!(ReadOutcome::TapeMark.to_string(), "Tape mark");
        assert!(ReadOutcome::Error(EIO).to_string().starts_with("Read error: "));
    }
}
