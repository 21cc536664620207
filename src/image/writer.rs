//! Image Encoder
//!
//! Appends units to an unbuffered byte sink. Sink failures are logged and
//! counted but never abort encoding: the framing bytes are considered
//! emitted once computed, whether or not the sink accepted them.

use super::{UnitHeader, MAX_RECORD_LEN, UNIT_END_OF_MEDIUM, UNIT_MARK};
use crate::error::{Result, TapeImageError};
use std::io::Write;
use tracing::warn;

/// Number of consecutive marks that denote logical end of tape
pub const DEFAULT_END_OF_TAPE_MARKS: u32 = 2;

/// Counters describing what reached the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Units emitted, including those whose write failed
    pub units: u64,
    /// Bytes the sink accepted
    pub bytes_written: u64,
    /// Short writes and write errors
    pub write_failures: u64,
}

pub struct ImageWriter<W: Write> {
    sink: W,
    trailing_marks: u32,
    end_of_tape_marks: u32,
    stats: WriteStats,
}

impl<W: Write> ImageWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            trailing_marks: 0,
            end_of_tape_marks: DEFAULT_END_OF_TAPE_MARKS,
            stats: WriteStats::default(),
        }
    }

    /// Override how many consecutive marks `write_end_of_tape` pads to
    pub fn with_end_of_tape_marks(mut self, marks: u32) -> Self {
        self.end_of_tape_marks = marks;
        self
    }

    /// Marks written since the last record
    pub fn trailing_marks(&self) -> u32 {
        self.trailing_marks
    }

    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Frame `payload` as a record unit.
    ///
    /// Empty payloads are indistinguishable from a tape mark and are
    /// refused without touching the sink.
    pub fn write_record(&mut self, payload: &[u8]) -> Result<()> {
        if payload.is_empty() {
            return Err(TapeImageError::EmptyRecord);
        }
        if payload.len() > MAX_RECORD_LEN {
            return Err(TapeImageError::RecordTooLong {
                length: payload.len(),
            });
        }

        let length = (payload.len() as u32).to_le_bytes();
        self.trailing_marks = 0;
        self.append(&length);
        self.append(payload);
        self.append(&length);
        self.stats.units += 1;
        Ok(())
    }

    pub fn write_mark(&mut self) {
        self.trailing_marks = self.trailing_marks.saturating_add(1);
        self.write_word(UNIT_MARK);
    }

    /// Pad with marks until the configured number of consecutive marks
    /// follows the last record. Returns how many marks were written.
    pub fn write_end_of_tape(&mut self) -> u32 {
        let mut written = 0;
        while self.trailing_marks < self.end_of_tape_marks {
            self.write_mark();
            written += 1;
        }
        written
    }

    pub fn write_end_of_medium(&mut self) {
        self.write_word(UNIT_END_OF_MEDIUM);
    }

    /// Only the low 24 bits of `code` survive.
    pub fn write_error(&mut self, code: u32) {
        self.write_word(UnitHeader::error_word(code));
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.sink.flush() {
            self.stats.write_failures += 1;
            warn!("Flush error: {}", e);
        }
    }

    fn write_word(&mut self, word: u32) {
        self.append(&word.to_le_bytes());
        self.stats.units += 1;
    }

    // Single write call per piece; no retry on short writes.
    fn append(&mut self, bytes: &[u8]) {
        match self.sink.write(bytes) {
            Ok(n) => {
                self.stats.bytes_written += n as u64;
                if n < bytes.len() {
                    self.stats.write_failures += 1;
                    warn!("Short write: {} of {} bytes", n, bytes.len());
                }
            }
            Err(e) => {
                self.stats.write_failures += 1;
                warn!("Write error: {}", e);
            }
        }
    }
}
