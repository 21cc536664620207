//! Tape Device Backend
//!
//! Opens a Linux st device read-only, switches it to variable block mode
//! and reads one physical record per `read(2)`.

use super::drive_types::{self, LINUX_DRIVE_TYPES};
use super::{ReadOutcome, TapeSource};
use crate::error::{Result, TapeImageError};
use std::fs::File;
use std::io::Read;
use tracing::{debug, warn};

#[cfg(target_os = "linux")]
mod mtio {
    use std::ffi::{c_int, c_long, c_short};

    /// `struct mtop`
    #[repr(C)]
    #[derive(Debug)]
    pub struct MtOp {
        pub mt_op: c_short,
        pub mt_count: c_int,
    }

    /// `struct mtget`
    #[repr(C)]
    #[derive(Debug)]
    pub struct MtGet {
        pub mt_type: c_long,
        pub mt_resid: c_long,
        pub mt_dsreg: c_long,
        pub mt_gstat: c_long,
        pub mt_erreg: c_long,
        pub mt_fileno: c_int,
        pub mt_blkno: c_int,
    }

    /// Set block length; 0 selects variable-length blocks
    pub const MTSETBLK: c_short = 20;

    nix::ioctl_write_ptr!(mtioctop, b'm', 1, MtOp);
    nix::ioctl_read!(mtiocget, b'm', 2, MtGet);
}

pub struct TapeDevice {
    file: File,
}

impl TapeDevice {
    /// Open `device_path` and configure it for variable-length blocks.
    /// Either failure means the tape cannot be imaged.
    pub fn open(device_path: &str) -> Result<Self> {
        debug!("Opening tape device: {}", device_path);

        #[cfg(target_os = "linux")]
        {
            use std::os::fd::AsRawFd;

            let file = File::open(device_path)
                .map_err(|e| TapeImageError::device_open(device_path, e))?;

            let op = mtio::MtOp {
                mt_op: mtio::MTSETBLK,
                mt_count: 0,
            };
            // SAFETY: `op` is a valid mtop for the lifetime of the call
            unsafe { mtio::mtioctop(file.as_raw_fd(), &op) }.map_err(|e| {
                TapeImageError::tape_device(format!(
                    "Couldn't set variable block size on {}: {}",
                    device_path,
                    std::io::Error::from(e)
                ))
            })?;

            debug!("Device opened in variable block mode: {}", device_path);
            Ok(Self { file })
        }

        #[cfg(not(target_os = "linux"))]
        {
            Err(TapeImageError::tape_device(format!(
                "Couldn't open {}: tape devices are only supported on Linux",
                device_path
            )))
        }
    }

    /// Raw `mt_type` code reported by the driver
    #[cfg(target_os = "linux")]
    pub fn drive_type_code(&self) -> Result<i64> {
        use std::os::fd::AsRawFd;

        // SAFETY: MtGet is plain old data; the driver fills it in
        let mut status: mtio::MtGet = unsafe { std::mem::zeroed() };
        unsafe { mtio::mtiocget(self.file.as_raw_fd(), &mut status) }.map_err(|e| {
            TapeImageError::tape_device(format!(
                "Couldn't get tape status: {}",
                std::io::Error::from(e)
            ))
        })?;
        Ok(i64::from(status.mt_type))
    }

    #[cfg(not(target_os = "linux"))]
    pub fn drive_type_code(&self) -> Result<i64> {
        Err(TapeImageError::tape_device("Tape status is only supported on Linux"))
    }
}

impl TapeSource for TapeDevice {
    fn read_next<'a>(&mut self, buffer: &'a mut [u8]) -> ReadOutcome<'a> {
        let result = self.file.read(buffer);
        ReadOutcome::from_read(buffer, result)
    }

    fn drive_name(&self) -> Option<String> {
        match self.drive_type_code() {
            Ok(code) => Some(
                drive_types::lookup(LINUX_DRIVE_TYPES, code)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("unknown (type 0x{:X})", code)),
            ),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device_fails() {
        let err = TapeDevice::open("/nonexistent/tape/nst0").err().unwrap();
        assert!(err.is_device_failure());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_open_regular_file_fails_to_configure() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();

        let err = TapeDevice::open(&path).err().unwrap();
        assert!(matches!(err, TapeImageError::TapeDevice(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_mtio_struct_layout() {
        use std::mem::size_of;
        use std::ffi::{c_int, c_long};

        assert_eq!(size_of::<mtio::MtOp>(), 2 * size_of::<c_int>());
        assert_eq!(
            size_of::<mtio::MtGet>(),
            5 * size_of::<c_long>() + 2 * size_of::<c_int>()
        );
    }
}
