//! Legacy libpcap reader: one 24-byte global header, then fixed-layout
//! records of a 16-byte header followed by `captured length` bytes.

use std::io::Read;

use pcap_parser::Linktype;
use tracing::{debug, warn};

use super::detect::TimeResolution;
use super::error::{CaptureError, SkipReason};
use super::layout;
use super::reader::{
    Endianness, FieldReader, ShortRead, read_body, read_fixed, read_fixed_or_eof,
};
use super::{PacketRecord, PacketSource, Timestamp};

/// Decoded legacy global header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalHeader {
    pub version_major: u16,
    pub version_minor: u16,
    pub snaplen: u32,
    pub linktype: Linktype,
}

pub struct LegacyPcapReader<R> {
    reader: R,
    endianness: Endianness,
    resolution: TimeResolution,
    header: Option<GlobalHeader>,
    skipped: u64,
    done: bool,
}

impl<R: Read> LegacyPcapReader<R> {
    /// Wrap a stream positioned at the global header.
    pub fn new(reader: R, endianness: Endianness, resolution: TimeResolution) -> Self {
        Self {
            reader,
            endianness,
            resolution,
            header: None,
            skipped: 0,
            done: false,
        }
    }

    fn read_global_header(&mut self) -> Result<GlobalHeader, CaptureError> {
        let mut buf = [0u8; layout::LEGACY_GLOBAL_HEADER_LEN];
        read_fixed(&mut self.reader, &mut buf, "pcap global header")?;
        let fields = FieldReader::new(&buf, self.endianness);
        let short = |err: ShortRead| err.truncated("pcap global header");
        let header = GlobalHeader {
            version_major: fields
                .read_u16(layout::LEGACY_VERSION_MAJOR_RANGE)
                .map_err(short)?,
            version_minor: fields
                .read_u16(layout::LEGACY_VERSION_MINOR_RANGE)
                .map_err(short)?,
            snaplen: fields.read_u32(layout::LEGACY_SNAPLEN_RANGE).map_err(short)?,
            linktype: Linktype(
                fields
                    .read_u32(layout::LEGACY_LINKTYPE_RANGE)
                    .map_err(short)? as i32,
            ),
        };
        debug!(
            version = %format!("{}.{}", header.version_major, header.version_minor),
            snaplen = header.snaplen,
            linktype = %header.linktype,
            "pcap global header"
        );
        Ok(header)
    }

    fn read_record(&mut self) -> Result<Option<PacketRecord>, CaptureError> {
        loop {
            let mut buf = [0u8; layout::LEGACY_RECORD_HEADER_LEN];
            if !read_fixed_or_eof(&mut self.reader, &mut buf, "pcap record header")? {
                return Ok(None);
            }
            let fields = FieldReader::new(&buf, self.endianness);
            let short = |err: ShortRead| err.truncated("pcap record header");
            let ts_sec = fields.read_u32(layout::RECORD_TS_SEC_RANGE).map_err(short)?;
            let ts_frac = fields.read_u32(layout::RECORD_TS_FRAC_RANGE).map_err(short)?;
            let captured_len = fields.read_u32(layout::RECORD_CAPLEN_RANGE).map_err(short)?;
            let original_len = fields.read_u32(layout::RECORD_ORIGLEN_RANGE).map_err(short)?;

            let declared = captured_len as usize;
            let data = read_body(&mut self.reader, declared)?;
            if data.len() < declared {
                let reason = SkipReason::TruncatedPayload {
                    declared,
                    available: data.len(),
                };
                debug!(%reason, "skipping pcap record");
                self.skipped += 1;
                continue;
            }

            return Ok(Some(PacketRecord {
                timestamp: Some(record_timestamp(ts_sec, ts_frac, self.resolution)),
                captured_len,
                original_len,
                interface_id: None,
                data,
            }));
        }
    }
}

impl<R: Read> PacketSource for LegacyPcapReader<R> {
    fn next_packet(&mut self) -> Result<Option<PacketRecord>, CaptureError> {
        if self.done {
            return Ok(None);
        }
        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        if let Err(err) = &result {
            warn!(error = %err, "pcap reading stopped");
        }
        result
    }

    fn skipped_blocks(&self) -> u64 {
        self.skipped
    }

    fn link_type(&self) -> Option<Linktype> {
        self.header.map(|header| header.linktype)
    }
}

impl<R: Read> LegacyPcapReader<R> {
    fn advance(&mut self) -> Result<Option<PacketRecord>, CaptureError> {
        if self.header.is_none() {
            self.header = Some(self.read_global_header()?);
        }
        self.read_record()
    }
}

fn record_timestamp(ts_sec: u32, ts_frac: u32, resolution: TimeResolution) -> Timestamp {
    let (secs, nanos) = match resolution {
        TimeResolution::Micro => (
            u64::from(ts_sec) + u64::from(ts_frac / 1_000_000),
            (ts_frac % 1_000_000) * 1_000,
        ),
        TimeResolution::Nano => (
            u64::from(ts_sec) + u64::from(ts_frac / 1_000_000_000),
            ts_frac % 1_000_000_000,
        ),
    };
    Timestamp {
        secs: secs as i64,
        nanos,
    }
}
