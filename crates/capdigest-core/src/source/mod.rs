//! Capture-file sources.
//!
//! A source classifies the stream from its magic bytes, then walks legacy
//! records or pcap-ng blocks front to back, yielding one `PacketRecord` per
//! packet. Structural problems that leave the stream position unknown are
//! fatal (`CaptureError`); problems confined to one record or block are
//! skipped and counted.

pub mod detect;
pub mod error;
pub mod layout;
pub mod legacy;
pub mod pcapng;
pub mod reader;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use pcap_parser::Linktype;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

pub use detect::{CaptureFormat, TimeResolution, detect_format};
pub use error::{CaptureError, SkipReason};
pub use legacy::{GlobalHeader, LegacyPcapReader};
pub use pcapng::{InterfaceInfo, PcapNgReader};
pub use reader::Endianness;

/// Capture timestamp as seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: u32,
}

impl Timestamp {
    /// RFC 3339 rendering in UTC, or `None` when out of range.
    pub fn to_rfc3339(&self) -> Option<String> {
        let nanos = i128::from(self.secs) * 1_000_000_000 + i128::from(self.nanos);
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok())
    }
}

/// One captured packet, as read from a record or block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    pub timestamp: Option<Timestamp>,
    pub captured_len: u32,
    pub original_len: u32,
    pub interface_id: Option<u32>,
    pub data: Vec<u8>,
}

pub trait PacketSource {
    /// Next packet, `Ok(None)` once the stream is exhausted. After an error
    /// the source is finished and only returns `Ok(None)`.
    fn next_packet(&mut self) -> Result<Option<PacketRecord>, CaptureError>;

    /// Records or blocks dropped so far for soft reasons.
    fn skipped_blocks(&self) -> u64 {
        0
    }

    /// Interfaces described so far (pcap-ng only).
    fn interfaces(&self) -> &[InterfaceInfo] {
        &[]
    }

    /// Link type from the global header (legacy only).
    fn link_type(&self) -> Option<Linktype> {
        None
    }
}

enum CaptureReader<R> {
    Legacy(LegacyPcapReader<R>),
    Ng(PcapNgReader<R>),
}

/// A capture stream bound to the reader matching its format.
pub struct CaptureFile<R> {
    format: CaptureFormat,
    inner: CaptureReader<R>,
}

impl CaptureFile<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> CaptureFile<R> {
    /// Detect the format (peek + rewind) and set up the matching reader.
    pub fn from_reader(mut reader: R) -> Result<Self, CaptureError> {
        let format = detect_format(&mut reader)?;
        debug!(format = format.name(), "capture format detected");
        let inner = match format {
            CaptureFormat::Legacy {
                endianness,
                resolution,
            } => CaptureReader::Legacy(LegacyPcapReader::new(reader, endianness, resolution)),
            CaptureFormat::PcapNg => CaptureReader::Ng(PcapNgReader::new(reader)),
        };
        Ok(Self { format, inner })
    }
}

impl<R> CaptureFile<R> {
    pub fn format(&self) -> CaptureFormat {
        self.format
    }
}

impl<R: Read> PacketSource for CaptureFile<R> {
    fn next_packet(&mut self) -> Result<Option<PacketRecord>, CaptureError> {
        match &mut self.inner {
            CaptureReader::Legacy(reader) => reader.next_packet(),
            CaptureReader::Ng(reader) => reader.next_packet(),
        }
    }

    fn skipped_blocks(&self) -> u64 {
        match &self.inner {
            CaptureReader::Legacy(reader) => reader.skipped_blocks(),
            CaptureReader::Ng(reader) => reader.skipped_blocks(),
        }
    }

    fn interfaces(&self) -> &[InterfaceInfo] {
        match &self.inner {
            CaptureReader::Legacy(reader) => reader.interfaces(),
            CaptureReader::Ng(reader) => reader.interfaces(),
        }
    }

    fn link_type(&self) -> Option<Linktype> {
        match &self.inner {
            CaptureReader::Legacy(reader) => reader.link_type(),
            CaptureReader::Ng(reader) => reader.link_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CaptureFile, CaptureFormat, PacketSource, Timestamp};
    use std::io::Cursor;

    #[test]
    fn timestamp_renders_rfc3339_utc() {
        let ts = Timestamp {
            secs: 1_700_000_000,
            nanos: 250_000_000,
        };
        assert_eq!(ts.to_rfc3339().as_deref(), Some("2023-11-14T22:13:20.25Z"));
        let epoch = Timestamp { secs: 0, nanos: 0 };
        assert_eq!(epoch.to_rfc3339().as_deref(), Some("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn capture_file_dispatches_on_magic() {
        let mut bytes = vec![0xd4, 0xc3, 0xb2, 0xa1];
        bytes.extend_from_slice(&[0u8; 20]);
        let mut capture = CaptureFile::from_reader(Cursor::new(bytes)).unwrap();
        assert!(matches!(capture.format(), CaptureFormat::Legacy { .. }));
        assert!(capture.next_packet().unwrap().is_none());
        assert_eq!(capture.link_type().map(|lt| lt.0), Some(0));
    }
}
