//! RustTapeImg Library
//!
//! Copies magnetic tapes into self-describing tape images: length-framed
//! records, tape marks, read errors and an end-of-medium sentinel, so the
//! tape can be replayed without the original drive.

pub mod cli;
pub mod commands;
pub mod config;
pub mod copy;
pub mod display;
pub mod error;
pub mod image;
pub mod logger;
pub mod tape;


// Re-export key types for easier use
pub use config::CopyPolicy;
pub use copy::{CopyController, CopyOutcome, CopyState, CopySummary, RunState};
pub use error::{Result, TapeImageError};
pub use image::{ImageReader, ImageUnit, ImageWriter, UnitHeader};
pub use tape::{ImageSource, ReadOutcome, TapeDevice, TapeSource};
