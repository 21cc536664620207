//! Drive type names
//!
//! Maps the `mt_type` field of a drive status query to a model name.
//! Backends carry their own table; the copy path only sees the string.

/// One entry of a drive type table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveType {
    pub code: i64,
    pub name: &'static str,
}

const fn drive(code: i64, name: &'static str) -> DriveType {
    DriveType { code, name }
}

/// `MT_IS*` codes from linux/mtio.h
pub const LINUX_DRIVE_TYPES: &[DriveType] = &[
    drive(0x01, "unknown"),
    drive(0x02, "Generic QIC-02 tape streamer"),
    drive(0x03, "Wangtek 5150EQ, QIC-150, QIC-02"),
    drive(0x04, "Archive 5945L-2, QIC-24, QIC-02?"),
    drive(0x05, "CMS Jumbo 500 (QIC-02?)"),
    drive(0x06, "Tandberg 6310, QIC-24"),
    drive(0x07, "Archive VP60i, QIC-02"),
    drive(0x08, "Archive Viper 2150L"),
    drive(0x09, "Archive Viper 2060L"),
    drive(0x0A, "Archive SC-499 QIC-36 controller"),
    drive(0x0F, "Generic QIC-02 with all features"),
    drive(0x11, "Wangtek 5099-een24, 60MB, QIC-24"),
    drive(0x12, "Teac MT-2ST"),
    drive(0x32, "Everex FT40A (QIC-40)"),
    drive(0x51, "DDS device without partitions"),
    drive(0x52, "DDS device with partitions"),
    drive(0x61, "Seagate's SCSI OnStream"),
    drive(0x71, "Generic ANSI SCSI-1 tape unit"),
    drive(0x72, "Generic ANSI SCSI-2 tape unit"),
    drive(0x80_0000, "Floppy tape (ftape)"),
];

/// Name for `code` in `table`
pub fn lookup(table: &[DriveType], code: i64) -> Option<&'static str> {
    table.iter().find(|d| d.code == code).map(|d| d.name)
}
