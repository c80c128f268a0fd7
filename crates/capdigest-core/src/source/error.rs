use std::fmt;

use thiserror::Error;

/// Fatal structural errors raised while walking a capture file.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unrecognized capture format (magic {magic:02x?})")]
    UnrecognizedFormat { magic: [u8; 4] },
    #[error("truncated {context}: need {needed} bytes, got {actual}")]
    TruncatedHeader {
        context: &'static str,
        needed: usize,
        actual: usize,
    },
}

impl CaptureError {
    pub(crate) fn truncated(context: &'static str, needed: usize, actual: usize) -> Self {
        CaptureError::TruncatedHeader {
            context,
            needed,
            actual,
        }
    }
}

/// Soft conditions: the current block or record is dropped and reading goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A declared body or capture length exceeds the bytes actually present.
    TruncatedPayload { declared: usize, available: usize },
    /// Block type this reader does not interpret.
    UnknownBlock { block_type: u32 },
    /// Block body shorter than the fixed fields of its type.
    ShortBody { block_type: u32, needed: usize, actual: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TruncatedPayload {
                declared,
                available,
            } => write!(
                f,
                "truncated payload: declared {declared} bytes, {available} available"
            ),
            SkipReason::UnknownBlock { block_type } => {
                write!(f, "unknown block type 0x{block_type:08x}")
            }
            SkipReason::ShortBody {
                block_type,
                needed,
                actual,
            } => write!(
                f,
                "block 0x{block_type:08x} body too short: need {needed} bytes, got {actual}"
            ),
        }
    }
}
