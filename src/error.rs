use thiserror::Error;

pub type Result<T> = std::result::Result<T, TapeImageError>;

#[derive(Error, Debug)]
pub enum TapeImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't open {device}: {source}")]
    DeviceOpen {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tape device error: {0}")]
    TapeDevice(String),

    #[error("Can't write empty record")]
    EmptyRecord,

    #[error("Record of {length} bytes exceeds the 0x7FFFFFFF byte image limit")]
    RecordTooLong { length: usize },

    #[error("Image truncated at offset {offset}")]
    Truncated { offset: u64 },

    #[error("Record length mismatch at offset {offset}: prefix {prefix}, suffix {suffix}")]
    LengthMismatch { offset: u64, prefix: u32, suffix: u32 },

    #[error("Invalid unit header 0x{value:08X} at offset {offset}")]
    InvalidHeader { offset: u64, value: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parameter validation error: {0}")]
    ParameterValidation(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl TapeImageError {
    pub fn device_open<T: Into<String>>(device: T, source: std::io::Error) -> Self {
        Self::DeviceOpen {
            device: device.into(),
            source,
        }
    }

    pub fn tape_device<T: Into<String>>(msg: T) -> Self {
        Self::TapeDevice(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn parameter_validation<T: Into<String>>(msg: T) -> Self {
        Self::ParameterValidation(msg.into())
    }

    /// True for failures that mean the tape could not be opened or configured
    pub fn is_device_failure(&self) -> bool {
        matches!(self, Self::DeviceOpen { .. } | Self::TapeDevice(_))
    }
}
