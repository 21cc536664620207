//! Display formatting for run summaries and image listings

use crate::copy::{CopyOutcome, CopySummary};
use crate::image::ImageUnit;
use crate::tape::error_message;
use tracing::{info, warn};

/// Format bytes in human-readable format
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// One line of an image listing
pub fn format_unit(offset: u64, unit: &ImageUnit) -> String {
    match unit {
        ImageUnit::Record(data) => format!("{:>12}  record  {} bytes", offset, data.len()),
        ImageUnit::Mark => format!("{:>12}  mark", offset),
        ImageUnit::Error(code) => format!(
            "{:>12}  error   {} ({})",
            offset,
            code,
            error_message(*code as i32)
        ),
        ImageUnit::EndOfMedium => format!("{:>12}  end of medium", offset),
    }
}

pub fn log_summary(summary: &CopySummary) {
    match summary.outcome {
        CopyOutcome::EndOfMedium => info!("Copy finished at guessed physical end of tape"),
        CopyOutcome::Cancelled => warn!("Copy cancelled before end of tape"),
    }
    info!(
        "Records: {}, tape marks: {}, read errors: {}, data: {}",
        summary.records,
        summary.marks,
        summary.errors,
        format_size(summary.bytes_read)
    );
    if summary.rejected > 0 {
        warn!("Rejected records: {}", summary.rejected);
    }
    if summary.write.write_failures > 0 {
        warn!(
            "Image incomplete: {} write failures, {} written",
            summary.write.write_failures,
            format_size(summary.write.bytes_written)
        );
    } else {
        info!("Image size: {}", format_size(summary.write.bytes_written));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(655360), "640.0 KB");
        assert_eq!(format_size(1073741824), "1.0 GB");
    }

    #[test]
    fn test_format_unit() {
        assert_eq!(
            format_unit(0, &ImageUnit::Record(vec![0; 80])),
            "           0  record  80 bytes"
        );
        assert_eq!(format_unit(88, &ImageUnit::Mark), "          88  mark");
        assert!(format_unit(92, &ImageUnit::Error(5)).contains("error   5 ("));
        assert!(format_unit(96, &ImageUnit::EndOfMedium).ends_with("end of medium"));
    }
}
