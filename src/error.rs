use thiserror::Error;

/// Everything that can go wrong while decoding or encoding a register block
/// or one of the frames wrapping it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("{field} value {value} is out of range {min}..={max}")]
    Range {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("unrecognised controller fault: {0:?}")]
    FaultName(String),

    #[error("unrecognised charging state: {0:?}")]
    ChargingStateName(String),

    #[error("invalid decimal value: {0:?}")]
    Decimal(String),

    #[error("encoded register block is {0} bytes")]
    Invariant(usize),

    #[error("malformed frame: {0}")]
    Frame(String),

    #[error("checksum mismatch - got {actual:02x?}, expected {expected:02x?}")]
    Checksum { expected: [u8; 2], actual: [u8; 2] },

    #[error("device returned modbus exception {0:#04x}")]
    Exception(u8),
}

impl CodecError {
    pub(crate) fn length(expected: usize, actual: usize) -> Self {
        Self::Length { expected, actual }
    }
}

/// Creates an anyhow error with the current file and line number
#[macro_export]
macro_rules! file_error {
    ($($arg:tt)*) => {
        anyhow::anyhow!(
            "[{}:{}] {}",
            std::path::Path::new(file!())
                .file_name()
                .map(|name| name.to_string_lossy())
                .unwrap_or_default(),
            line!(),
            format!($($arg)*)
        )
    };
}
