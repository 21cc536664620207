//! Image Replay
//!
//! Presents an existing image as a tape. Once the image runs out (or its
//! end-of-medium unit is reached) every read fails with EIO, which is how
//! a real drive behaves past the end of its tape.

use super::{ReadOutcome, TapeSource, EIO, ENOMEM};
use crate::error::Result;
use crate::image::{ImageReader, ImageUnit};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, error, warn};

pub struct ImageSource<R: Read + Seek> {
    reader: ImageReader<R>,
    exhausted: bool,
}

impl ImageSource<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening image for replay: {:?}", path);
        let file = File::open(path)
            .map_err(|e| crate::error::TapeImageError::device_open(path.to_string_lossy(), e))?;
        Self::new(file)
    }
}

impl<R: Read + Seek> ImageSource<R> {
    pub fn new(inner: R) -> Result<Self> {
        Ok(Self {
            reader: ImageReader::new(inner)?,
            exhausted: false,
        })
    }

    /// True once the replay has run off the end of the image
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<R: Read + Seek> TapeSource for ImageSource<R> {
    fn read_next<'a>(&mut self, buffer: &'a mut [u8]) -> ReadOutcome<'a> {
        if self.exhausted {
            return ReadOutcome::Error(EIO);
        }

        match self.reader.next_unit() {
            Ok(Some(ImageUnit::Record(data))) => {
                if data.len() > buffer.len() {
                    warn!(
                        "Record of {} bytes does not fit the {} byte buffer",
                        data.len(),
                        buffer.len()
                    );
                    return ReadOutcome::Error(ENOMEM);
                }
                buffer[..data.len()].copy_from_slice(&data);
                ReadOutcome::Data(&buffer[..data.len()])
            }
            Ok(Some(ImageUnit::Mark)) => ReadOutcome::TapeMark,
            Ok(Some(ImageUnit::Error(code))) => ReadOutcome::Error(code as i32),
            Ok(Some(ImageUnit::EndOfMedium)) | Ok(None) => {
                self.exhausted = true;
                ReadOutcome::Error(EIO)
            }
            Err(e) => {
                error!("Image decode failed at offset {}: {}", self.reader.position(), e);
                self.exhausted = true;
                ReadOutcome::Error(EIO)
            }
        }
    }

    fn drive_name(&self) -> Option<String> {
        Some("Image replay".to_string())
    }
}
