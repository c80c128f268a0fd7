use std::io::{Read, Seek, SeekFrom};

use super::error::CaptureError;
use super::layout;
use super::reader::{Endianness, read_fixed};

/// Timestamp fraction unit of a legacy capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeResolution {
    Micro,
    Nano,
}

/// Capture layout classified from the leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Legacy {
        endianness: Endianness,
        resolution: TimeResolution,
    },
    PcapNg,
}

impl CaptureFormat {
    /// Short name used in structured output.
    pub fn name(&self) -> &'static str {
        match self {
            CaptureFormat::Legacy { .. } => "pcap",
            CaptureFormat::PcapNg => "pcapng",
        }
    }
}

/// Read the magic bytes and rewind the reader to the start.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use std::io::Cursor;
///
/// let bytes = [0x0a, 0x0d, 0x0d, 0x0a, 0x01];
/// let mut cursor = Cursor::new(bytes);
/// let magic = read_magic_and_rewind(&mut cursor).unwrap();
/// assert_eq!(magic, [0x0a, 0x0d, 0x0d, 0x0a]);
/// ```
///
/// # Errors
/// Returns `CaptureError::TruncatedHeader` when fewer than four bytes exist,
/// or `CaptureError::Io` when the reader cannot be read or rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(
    reader: &mut R,
) -> Result<[u8; layout::MAGIC_LEN], CaptureError> {
    let mut magic = [0u8; layout::MAGIC_LEN];
    read_fixed(reader, &mut magic, "file magic")?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

/// Classify a magic number.
pub fn classify_magic(magic: [u8; layout::MAGIC_LEN]) -> Result<CaptureFormat, CaptureError> {
    let format = match magic {
        layout::PCAPNG_MAGIC => CaptureFormat::PcapNg,
        layout::LEGACY_MICRO_LE => legacy(Endianness::Little, TimeResolution::Micro),
        layout::LEGACY_MICRO_BE => legacy(Endianness::Big, TimeResolution::Micro),
        layout::LEGACY_NANO_LE => legacy(Endianness::Little, TimeResolution::Nano),
        layout::LEGACY_NANO_BE => legacy(Endianness::Big, TimeResolution::Nano),
        _ => return Err(CaptureError::UnrecognizedFormat { magic }),
    };
    Ok(format)
}

/// Peek the magic, rewind, and classify the stream.
pub fn detect_format<R: Read + Seek>(reader: &mut R) -> Result<CaptureFormat, CaptureError> {
    let magic = read_magic_and_rewind(reader)?;
    classify_magic(magic)
}

fn legacy(endianness: Endianness, resolution: TimeResolution) -> CaptureFormat {
    CaptureFormat::Legacy {
        endianness,
        resolution,
    }
}
