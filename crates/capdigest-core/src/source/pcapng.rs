//! pcap-ng reader.
//!
//! Blocks are self-delimited: type, total length, `total length - 12` body
//! bytes, then the total length repeated. Field byte order follows the
//! byte-order magic of the enclosing section header; before any section
//! header is seen, little-endian is assumed. Interface ids in packet blocks
//! are relative to the current section.

use std::io::Read;

use pcap_parser::Linktype;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::error::{CaptureError, SkipReason};
use super::layout;
use super::reader::{
    Endianness, FieldReader, ShortRead, read_body, read_fixed, read_fixed_or_eof,
};
use super::{PacketRecord, PacketSource, Timestamp};

/// Metadata from one Interface Description Block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub link_type: u16,
    pub snap_len: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw `if_tsresol` byte, when the option is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_resolution: Option<u8>,
}

impl InterfaceInfo {
    pub fn linktype(&self) -> Linktype {
        Linktype(i32::from(self.link_type))
    }
}

/// Block types this reader distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    SectionHeader,
    InterfaceDescription,
    EnhancedPacket,
    SimplePacket,
    ObsoletePacket,
    Unknown(u32),
}

impl BlockKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            layout::BLOCK_SECTION_HEADER => BlockKind::SectionHeader,
            layout::BLOCK_INTERFACE_DESCRIPTION => BlockKind::InterfaceDescription,
            layout::BLOCK_ENHANCED_PACKET => BlockKind::EnhancedPacket,
            layout::BLOCK_SIMPLE_PACKET => BlockKind::SimplePacket,
            layout::BLOCK_OBSOLETE_PACKET => BlockKind::ObsoletePacket,
            other => BlockKind::Unknown(other),
        }
    }
}

/// One TLV option: 2-byte code, 2-byte length, value padded to 4 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOption<'a> {
    pub code: u16,
    pub value: &'a [u8],
}

/// Iterator over an option list. Stops at `opt_endofopt`, at the end of the
/// buffer, or at the first option whose value runs past the buffer.
pub struct BlockOptions<'a> {
    bytes: &'a [u8],
    offset: usize,
    endianness: Endianness,
}

impl<'a> BlockOptions<'a> {
    pub fn new(bytes: &'a [u8], endianness: Endianness) -> Self {
        Self {
            bytes,
            offset: 0,
            endianness,
        }
    }
}

impl<'a> Iterator for BlockOptions<'a> {
    type Item = BlockOption<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let fields = FieldReader::new(self.bytes.get(self.offset..)?, self.endianness);
        let code = fields.read_u16(0..2).ok()?;
        let len = usize::from(fields.read_u16(2..4).ok()?);
        if code == layout::OPT_END_OF_OPT {
            return None;
        }
        let value_end = layout::OPTION_HEADER_LEN + len;
        let value = fields.read_slice(layout::OPTION_HEADER_LEN..value_end).ok()?;
        let padded = (len + 3) & !3;
        self.offset += layout::OPTION_HEADER_LEN + padded;
        Some(BlockOption { code, value })
    }
}

pub struct PcapNgReader<R> {
    reader: R,
    endianness: Endianness,
    interfaces: Vec<InterfaceInfo>,
    section_base: usize,
    skipped: u64,
    done: bool,
}

enum BlockOutcome {
    Packet(PacketRecord),
    Consumed,
    Skipped(SkipReason),
}

impl<R: Read> PcapNgReader<R> {
    /// Wrap a stream positioned at the first block.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            endianness: Endianness::Little,
            interfaces: Vec::new(),
            section_base: 0,
            skipped: 0,
            done: false,
        }
    }

    fn advance(&mut self) -> Result<Option<PacketRecord>, CaptureError> {
        loop {
            let Some((block_type, body)) = self.read_block()? else {
                return Ok(None);
            };
            match self.handle_block(block_type, &body) {
                BlockOutcome::Packet(record) => return Ok(Some(record)),
                BlockOutcome::Consumed => {}
                BlockOutcome::Skipped(reason) => {
                    debug!(%reason, "skipping pcapng block");
                    self.skipped += 1;
                }
            }
        }
    }

    /// Read one block and return its type code and body (without the framing).
    fn read_block(&mut self) -> Result<Option<(u32, Vec<u8>)>, CaptureError> {
        let mut header = [0u8; layout::BLOCK_HEADER_LEN];
        if !read_fixed_or_eof(&mut self.reader, &mut header, "block header")? {
            return Ok(None);
        }
        let type_bytes = [header[0], header[1], header[2], header[3]];
        let length_bytes = [header[4], header[5], header[6], header[7]];

        let mut prefix = Vec::new();
        if type_bytes == layout::PCAPNG_MAGIC {
            let mut bom = [0u8; 4];
            read_fixed(&mut self.reader, &mut bom, "section header byte-order magic")?;
            self.endianness = section_endianness(bom).unwrap_or_else(|| {
                warn!(magic = ?bom, "unknown section byte-order magic, assuming little-endian");
                Endianness::Little
            });
            prefix.extend_from_slice(&bom);
        }

        let block_type = self.endianness.u32(type_bytes);
        let total_len = self.endianness.u32(length_bytes) as usize;
        trace!(block_type, total_len, "pcapng block header");
        if total_len < layout::BLOCK_FRAMING_LEN + prefix.len() {
            return Err(CaptureError::truncated(
                "block length",
                layout::BLOCK_FRAMING_LEN + prefix.len(),
                total_len,
            ));
        }

        let body_len = total_len - layout::BLOCK_FRAMING_LEN;
        let rest = read_body(&mut self.reader, body_len - prefix.len())?;
        if rest.len() < body_len - prefix.len() {
            return Err(CaptureError::truncated(
                "block body",
                body_len,
                prefix.len() + rest.len(),
            ));
        }
        let mut body = prefix;
        body.extend_from_slice(&rest);

        let mut trailer = [0u8; layout::BLOCK_TRAILER_LEN];
        read_fixed(&mut self.reader, &mut trailer, "block trailer")?;
        let trailing_len = self.endianness.u32(trailer) as usize;
        if trailing_len != total_len {
            trace!(total_len, trailing_len, "block trailer length mismatch");
        }

        Ok(Some((block_type, body)))
    }

    fn handle_block(&mut self, block_type: u32, body: &[u8]) -> BlockOutcome {
        match BlockKind::from_code(block_type) {
            BlockKind::SectionHeader => {
                self.section_base = self.interfaces.len();
                debug!(endianness = ?self.endianness, "pcapng section header");
                BlockOutcome::Consumed
            }
            BlockKind::InterfaceDescription => {
                match parse_interface(body, self.endianness) {
                    Ok(info) => {
                        debug!(
                            id = self.interfaces.len() - self.section_base,
                            linktype = %info.linktype(),
                            name = info.name.as_deref().unwrap_or(""),
                            "pcapng interface"
                        );
                        self.interfaces.push(info);
                        BlockOutcome::Consumed
                    }
                    Err(short) => BlockOutcome::Skipped(short_body(block_type, short)),
                }
            }
            BlockKind::EnhancedPacket => self.enhanced_packet(body),
            BlockKind::SimplePacket => simple_packet(body, self.endianness),
            BlockKind::ObsoletePacket => self.obsolete_packet(body),
            BlockKind::Unknown(_) => BlockOutcome::Skipped(SkipReason::UnknownBlock { block_type }),
        }
    }

    fn enhanced_packet(&self, body: &[u8]) -> BlockOutcome {
        let header = match enhanced_packet_header(body, self.endianness) {
            Ok(header) => header,
            Err(short) => {
                return BlockOutcome::Skipped(short_body(layout::BLOCK_ENHANCED_PACKET, short));
            }
        };
        self.packet_record(body, layout::EPB_DATA_OFFSET, header)
    }

    fn obsolete_packet(&self, body: &[u8]) -> BlockOutcome {
        let header = match obsolete_packet_header(body, self.endianness) {
            Ok(header) => header,
            Err(short) => {
                return BlockOutcome::Skipped(short_body(layout::BLOCK_OBSOLETE_PACKET, short));
            }
        };
        self.packet_record(body, layout::OPB_DATA_OFFSET, header)
    }

    fn packet_record(&self, body: &[u8], offset: usize, header: PacketHeader) -> BlockOutcome {
        let Some(data) = packet_data(body, offset, header.captured_len) else {
            return BlockOutcome::Skipped(truncated_payload(body, offset, header.captured_len));
        };
        BlockOutcome::Packet(PacketRecord {
            timestamp: self.packet_timestamp(header.interface_id, header.ts_high, header.ts_low),
            captured_len: header.captured_len,
            original_len: header.original_len,
            interface_id: Some(header.interface_id),
            data: data.to_vec(),
        })
    }

    /// Scale the 64-bit tick count by the interface's `if_tsresol`.
    fn packet_timestamp(&self, interface_id: u32, ts_high: u32, ts_low: u32) -> Option<Timestamp> {
        let tsresol = self
            .section_base
            .checked_add(interface_id as usize)
            .and_then(|idx| self.interfaces.get(idx))
            .and_then(|info| info.time_resolution)
            .unwrap_or(layout::DEFAULT_TSRESOL);
        let ticks = (u64::from(ts_high) << 32) | u64::from(ts_low);
        ticks_to_timestamp(ticks, tsresol)
    }
}

impl<R: Read> PacketSource for PcapNgReader<R> {
    fn next_packet(&mut self) -> Result<Option<PacketRecord>, CaptureError> {
        if self.done {
            return Ok(None);
        }
        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        if let Err(err) = &result {
            warn!(error = %err, "pcapng reading stopped");
        }
        result
    }

    fn skipped_blocks(&self) -> u64 {
        self.skipped
    }

    fn interfaces(&self) -> &[InterfaceInfo] {
        &self.interfaces
    }
}

fn section_endianness(bom: [u8; 4]) -> Option<Endianness> {
    if u32::from_le_bytes(bom) == layout::BYTE_ORDER_MAGIC {
        Some(Endianness::Little)
    } else if u32::from_be_bytes(bom) == layout::BYTE_ORDER_MAGIC {
        Some(Endianness::Big)
    } else {
        None
    }
}

/// Decode an Interface Description Block body.
pub fn parse_interface(body: &[u8], endianness: Endianness) -> Result<InterfaceInfo, ShortRead> {
    let fields = FieldReader::new(body, endianness);
    fields.require_len(layout::IDB_OPTIONS_OFFSET)?;
    let mut info = InterfaceInfo {
        link_type: fields.read_u16(layout::IDB_LINKTYPE_RANGE)?,
        snap_len: fields.read_u32(layout::IDB_SNAPLEN_RANGE)?,
        name: None,
        description: None,
        time_resolution: None,
    };

    let options = fields.read_slice(layout::IDB_OPTIONS_OFFSET..body.len())?;
    for option in BlockOptions::new(options, endianness) {
        match option.code {
            layout::OPT_IF_NAME => info.name = option_string(option.value),
            layout::OPT_IF_DESCRIPTION => info.description = option_string(option.value),
            layout::OPT_IF_TSRESOL => {
                if let [resolution] = option.value {
                    info.time_resolution = Some(*resolution);
                }
            }
            _ => {}
        }
    }
    Ok(info)
}

/// Option text with trailing NUL padding removed.
fn option_string(value: &[u8]) -> Option<String> {
    let end = value
        .iter()
        .rposition(|&byte| byte != 0)
        .map_or(0, |idx| idx + 1);
    if end == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&value[..end]).into_owned())
}

/// Convert a tick count to seconds + nanoseconds.
///
/// `tsresol` with the high bit clear is a negative power of ten, otherwise a
/// negative power of two. Returns `None` for resolutions that cannot be
/// represented in 64 bits.
pub fn ticks_to_timestamp(ticks: u64, tsresol: u8) -> Option<Timestamp> {
    let exponent = u32::from(tsresol & 0x7f);
    let per_second = if tsresol & 0x80 == 0 {
        10u64.checked_pow(exponent)?
    } else {
        1u64.checked_shl(exponent)?
    };
    let secs = ticks / per_second;
    let rem = ticks % per_second;
    let nanos = (u128::from(rem) * 1_000_000_000 / u128::from(per_second)) as u32;
    Some(Timestamp {
        secs: i64::try_from(secs).ok()?,
        nanos,
    })
}

fn simple_packet(body: &[u8], endianness: Endianness) -> BlockOutcome {
    let fields = FieldReader::new(body, endianness);
    let original_len = match fields.read_u32(layout::SPB_ORIGLEN_RANGE) {
        Ok(len) => len,
        Err(short) => {
            return BlockOutcome::Skipped(short_body(layout::BLOCK_SIMPLE_PACKET, short));
        }
    };
    let Some(data) = packet_data(body, layout::SPB_DATA_OFFSET, original_len) else {
        return BlockOutcome::Skipped(truncated_payload(
            body,
            layout::SPB_DATA_OFFSET,
            original_len,
        ));
    };
    BlockOutcome::Packet(PacketRecord {
        timestamp: None,
        captured_len: original_len,
        original_len,
        interface_id: None,
        data: data.to_vec(),
    })
}

fn packet_data(body: &[u8], offset: usize, captured_len: u32) -> Option<&[u8]> {
    let end = offset.checked_add(captured_len as usize)?;
    body.get(offset..end)
}

fn truncated_payload(body: &[u8], offset: usize, captured_len: u32) -> SkipReason {
    SkipReason::TruncatedPayload {
        declared: captured_len as usize,
        available: body.len().saturating_sub(offset),
    }
}

fn short_body(block_type: u32, short: ShortRead) -> SkipReason {
    SkipReason::ShortBody {
        block_type,
        needed: short.needed,
        actual: short.actual,
    }
}

/// Fixed fields shared by enhanced and obsolete packet blocks.
#[derive(Debug, Clone, Copy)]
struct PacketHeader {
    interface_id: u32,
    ts_high: u32,
    ts_low: u32,
    captured_len: u32,
    original_len: u32,
}

fn enhanced_packet_header(body: &[u8], endianness: Endianness) -> Result<PacketHeader, ShortRead> {
    let fields = FieldReader::new(body, endianness);
    fields.require_len(layout::EPB_DATA_OFFSET)?;
    Ok(PacketHeader {
        interface_id: fields.read_u32(layout::EPB_INTERFACE_RANGE)?,
        ts_high: fields.read_u32(layout::EPB_TS_HIGH_RANGE)?,
        ts_low: fields.read_u32(layout::EPB_TS_LOW_RANGE)?,
        captured_len: fields.read_u32(layout::EPB_CAPLEN_RANGE)?,
        original_len: fields.read_u32(layout::EPB_ORIGLEN_RANGE)?,
    })
}

/// The 16-bit drop counter at bytes 2..4 is ignored.
fn obsolete_packet_header(body: &[u8], endianness: Endianness) -> Result<PacketHeader, ShortRead> {
    let fields = FieldReader::new(body, endianness);
    fields.require_len(layout::OPB_DATA_OFFSET)?;
    Ok(PacketHeader {
        interface_id: u32::from(fields.read_u16(layout::OPB_INTERFACE_RANGE)?),
        ts_high: fields.read_u32(layout::OPB_TS_HIGH_RANGE)?,
        ts_low: fields.read_u32(layout::OPB_TS_LOW_RANGE)?,
        captured_len: fields.read_u32(layout::OPB_CAPLEN_RANGE)?,
        original_len: fields.read_u32(layout::OPB_ORIGLEN_RANGE)?,
    })
}
