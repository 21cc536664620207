//! Tape Image Format
//!
//! An image is a flat sequence of units, each introduced by a 4-byte
//! little-endian header word:
//!
//! ```text
//! record        := u32(length) bytes[length] u32(length)   ; 1..=0x7FFFFFFF
//! mark          := u32(0x00000000)
//! error         := u32(0x80000000 | (code & 0x00FFFFFF))
//! end_of_medium := u32(0xFFFFFFFF)
//! ```
//!
//! The trailing length of a record lets the image be walked backwards
//! without an index.

pub mod reader;
pub mod writer;

pub use reader::ImageReader;
pub use writer::{ImageWriter, WriteStats};

/// Tape mark
pub const UNIT_MARK: u32 = 0x0000_0000;
/// Mask applied to record lengths
pub const UNIT_LENGTH_MASK: u32 = 0x7FFF_FFFF;
/// Error tag bit
pub const UNIT_ERROR: u32 = 0x8000_0000;
/// Mask applied to error codes
pub const UNIT_ERROR_MASK: u32 = 0x00FF_FFFF;
/// End of medium
pub const UNIT_END_OF_MEDIUM: u32 = 0xFFFF_FFFF;

/// Size of every header word in bytes
pub const HEADER_LEN: usize = 4;

/// Largest payload a record unit can frame
pub const MAX_RECORD_LEN: usize = UNIT_LENGTH_MASK as usize;

/// Classified header word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitHeader {
    Record(u32),
    Mark,
    Error(u32),
    EndOfMedium,
    /// Bit 31 set with reserved bits 24-30 non-zero
    Reserved(u32),
}

impl UnitHeader {
    pub fn classify(value: u32) -> Self {
        match value {
            UNIT_MARK => UnitHeader::Mark,
            UNIT_END_OF_MEDIUM => UnitHeader::EndOfMedium,
            v if v & UNIT_ERROR == 0 => UnitHeader::Record(v),
            v if v & !(UNIT_ERROR | UNIT_ERROR_MASK) == 0 => UnitHeader::Error(v & UNIT_ERROR_MASK),
            v => UnitHeader::Reserved(v),
        }
    }

    /// Header word for an error unit carrying `code`
    pub fn error_word(code: u32) -> u32 {
        UNIT_ERROR | (code & UNIT_ERROR_MASK)
    }
}

/// One decoded image unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUnit {
    Record(Vec<u8>),
    Mark,
    Error(u32),
    EndOfMedium,
}
