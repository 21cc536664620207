//! Dump Command Handler
//!
//! Handles the `dump` subcommand for listing the units of a tape image.

use crate::display;
use crate::error::Result;
use crate::image::{ImageReader, ImageUnit};
use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::PathBuf;
use tracing::info;

/// Unit counts of a listed image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpTally {
    pub records: u64,
    pub marks: u64,
    pub errors: u64,
    pub end_of_medium: u64,
    pub payload_bytes: u64,
}

impl DumpTally {
    fn count(&mut self, unit: &ImageUnit) {
        match unit {
            ImageUnit::Record(data) => {
                self.records += 1;
                self.payload_bytes += data.len() as u64;
            }
            ImageUnit::Mark => self.marks += 1,
            ImageUnit::Error(_) => self.errors += 1,
            ImageUnit::EndOfMedium => self.end_of_medium += 1,
        }
    }
}

pub async fn execute(image: PathBuf, reverse: bool) -> Result<DumpTally> {
    info!("Listing image: {:?}", image);

    let mut reader = ImageReader::new(File::open(&image)?)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let tally = list_units(&mut reader, reverse, &mut out)?;

    writeln!(
        out,
        "{} records ({}), {} marks, {} errors, {} end of medium",
        tally.records,
        display::format_size(tally.payload_bytes),
        tally.marks,
        tally.errors,
        tally.end_of_medium
    )?;
    Ok(tally)
}

/// Write one line per unit to `out`, front to back or back to front
pub fn list_units<R: Read + Seek, W: Write>(
    reader: &mut ImageReader<R>,
    reverse: bool,
    out: &mut W,
) -> Result<DumpTally> {
    let mut tally = DumpTally::default();

    if reverse {
        reader.seek_to_end();
        while let Some(unit) = reader.prev_unit()? {
            writeln!(out, "{}", display::format_unit(reader.position(), &unit))?;
            tally.count(&unit);
        }
    } else {
        reader.rewind();
        loop {
            let offset = reader.position();
            match reader.next_unit()? {
                Some(unit) => {
                    writeln!(out, "{}", display::format_unit(offset, &unit))?;
                    tally.count(&unit);
                }
                None => break,
            }
        }
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TapeImageError;
    use crate::image::ImageWriter;
    use std::io::Cursor;

    fn sample() -> ImageReader<Cursor<Vec<u8>>> {
        let mut writer = ImageWriter::new(Vec::new());
        writer.write_record(&[1u8; 80]).unwrap();
        writer.write_mark();
        writer.write_error(5);
        writer.write_end_of_medium();
        ImageReader::new(Cursor::new(writer.into_inner())).unwrap()
    }

    #[test]
    fn test_forward_listing() {
        let mut out = Vec::new();
        let tally = list_units(&mut sample(), false, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].trim_start().starts_with("0  record  80 bytes"));
        assert!(lines[1].trim_start().starts_with("88  mark"));
        assert!(lines[2].trim_start().starts_with("92  error   5"));
        assert!(lines[3].trim_start().starts_with("96  end of medium"));
        assert_eq!(
            tally,
            DumpTally {
                records: 1,
                marks: 1,
                errors: 1,
                end_of_medium: 1,
                payload_bytes: 80,
            }
        );
    }

    #[test]
    fn test_reverse_listing_matches_forward() {
        let mut forward = Vec::new();
        let mut backward = Vec::new();
        let a = list_units(&mut sample(), false, &mut forward).unwrap();
        let b = list_units(&mut sample(), true, &mut backward).unwrap();

        let mut reversed: Vec<String> = String::from_utf8(backward)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        reversed.reverse();
        let forward: Vec<String> = String::from_utf8(forward)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();

        assert_eq!(forward, reversed);
        assert_eq!(a, b);
    }

    #[test]
    fn test_corrupt_image_stops_listing() {
        let mut reader = ImageReader::new(Cursor::new(vec![4u8, 0, 0, 0, 1, 2])).unwrap();
        let mut out = Vec::new();
        let err = list_units(&mut reader, false, &mut out).unwrap_err();
        assert!(matches!(err, TapeImageError::Truncated { offset: 0 }));
        assert!(out.is_empty());
    }
}
