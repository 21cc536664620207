//! Image Decoder
//!
//! Walks an image forwards with the record prefixes or backwards with the
//! record suffixes.

use super::{ImageUnit, UnitHeader, HEADER_LEN};
use crate::error::{Result, TapeImageError};
use std::io::{Read, Seek, SeekFrom};

pub struct ImageReader<R: Read + Seek> {
    inner: R,
    position: u64,
    len: u64,
}

impl<R: Read + Seek> ImageReader<R> {
    /// Wrap `inner`, positioned at the start of the image
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            position: 0,
            len,
        })
    }

    /// Byte offset of the next unit boundary
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn seek_to_end(&mut self) {
        self.position = self.len;
    }

    /// Decode the unit starting at the current position. `None` once the
    /// whole image has been consumed.
    pub fn next_unit(&mut self) -> Result<Option<ImageUnit>> {
        if self.position >= self.len {
            return Ok(None);
        }

        let offset = self.position;
        let word = self.read_word_at(offset)?;
        let (unit, next) = match UnitHeader::classify(word) {
            UnitHeader::Record(length) => {
                let payload_start = offset + HEADER_LEN as u64;
                let suffix_offset = payload_start + u64::from(length);
                if suffix_offset + HEADER_LEN as u64 > self.len {
                    return Err(TapeImageError::Truncated { offset });
                }
                let payload = self.read_payload_at(payload_start, length)?;
                let suffix = self.read_word_at(suffix_offset)?;
                if suffix != length {
                    return Err(TapeImageError::LengthMismatch {
                        offset,
                        prefix: length,
                        suffix,
                    });
                }
                (ImageUnit::Record(payload), suffix_offset + HEADER_LEN as u64)
            }
            header => (Self::sentinel_unit(header, offset)?, offset + HEADER_LEN as u64),
        };

        self.position = next;
        Ok(Some(unit))
    }

    /// Decode the unit ending at the current position. `None` at the
    /// start of the image.
    pub fn prev_unit(&mut self) -> Result<Option<ImageUnit>> {
        if self.position == 0 {
            return Ok(None);
        }
        if self.position < HEADER_LEN as u64 {
            return Err(TapeImageError::Truncated { offset: 0 });
        }

        let suffix_offset = self.position - HEADER_LEN as u64;
        let word = self.read_word_at(suffix_offset)?;
        let (unit, start) = match UnitHeader::classify(word) {
            UnitHeader::Record(length) => {
                let framed = u64::from(length) + HEADER_LEN as u64;
                if suffix_offset < framed {
                    return Err(TapeImageError::Truncated {
                        offset: suffix_offset,
                    });
                }
                let payload_start = suffix_offset - u64::from(length);
                let prefix_offset = payload_start - HEADER_LEN as u64;
                let prefix = self.read_word_at(prefix_offset)?;
                if prefix != length {
                    return Err(TapeImageError::LengthMismatch {
                        offset: prefix_offset,
                        prefix,
                        suffix: length,
                    });
                }
                let payload = self.read_payload_at(payload_start, length)?;
                (ImageUnit::Record(payload), prefix_offset)
            }
            header => (Self::sentinel_unit(header, suffix_offset)?, suffix_offset),
        };

        self.position = start;
        Ok(Some(unit))
    }

    fn sentinel_unit(header: UnitHeader, offset: u64) -> Result<ImageUnit> {
        match header {
            UnitHeader::Mark => Ok(ImageUnit::Mark),
            UnitHeader::Error(code) => Ok(ImageUnit::Error(code)),
            UnitHeader::EndOfMedium => Ok(ImageUnit::EndOfMedium),
            UnitHeader::Reserved(value) => Err(TapeImageError::InvalidHeader { offset, value }),
            UnitHeader::Record(_) => unreachable!("records are framed by the caller"),
        }
    }

    fn read_word_at(&mut self, offset: u64) -> Result<u32> {
        if offset + HEADER_LEN as u64 > self.len {
            return Err(TapeImageError::Truncated { offset });
        }
        let mut word = [0u8; HEADER_LEN];
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(&mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    fn read_payload_at(&mut self, offset: u64, length: u32) -> Result<Vec<u8>> {
        if offset + u64::from(length) > self.len {
            return Err(TapeImageError::Truncated { offset });
        }
        let mut payload = vec![0u8; length as usize];
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(&mut payload)?;
        Ok(payload)
    }
}
