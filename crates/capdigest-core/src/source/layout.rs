//! Fixed sizes, magic numbers and type codes of both capture layouts.

/// pcap-ng section header block type, as it appears on disk (palindromic).
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

/// Legacy magics as they appear on disk (first four file bytes).
pub const LEGACY_MICRO_LE: [u8; 4] = [0xd4, 0xc3, 0xb2, 0xa1];
pub const LEGACY_MICRO_BE: [u8; 4] = [0xa1, 0xb2, 0xc3, 0xd4];
pub const LEGACY_NANO_LE: [u8; 4] = [0x4d, 0x3c, 0xb2, 0xa1];
pub const LEGACY_NANO_BE: [u8; 4] = [0xa1, 0xb2, 0x3c, 0x4d];

pub const MAGIC_LEN: usize = 4;

pub const LEGACY_GLOBAL_HEADER_LEN: usize = 24;
pub const LEGACY_VERSION_MAJOR_RANGE: std::ops::Range<usize> = 4..6;
pub const LEGACY_VERSION_MINOR_RANGE: std::ops::Range<usize> = 6..8;
pub const LEGACY_SNAPLEN_RANGE: std::ops::Range<usize> = 16..20;
pub const LEGACY_LINKTYPE_RANGE: std::ops::Range<usize> = 20..24;

pub const LEGACY_RECORD_HEADER_LEN: usize = 16;
pub const RECORD_TS_SEC_RANGE: std::ops::Range<usize> = 0..4;
pub const RECORD_TS_FRAC_RANGE: std::ops::Range<usize> = 4..8;
pub const RECORD_CAPLEN_RANGE: std::ops::Range<usize> = 8..12;
pub const RECORD_ORIGLEN_RANGE: std::ops::Range<usize> = 12..16;

/// Type + total length.
pub const BLOCK_HEADER_LEN: usize = 8;
/// Type + total length + trailing total length.
pub const BLOCK_FRAMING_LEN: usize = 12;
pub const BLOCK_TRAILER_LEN: usize = 4;

pub const BLOCK_SECTION_HEADER: u32 = 0x0A0D_0D0A;
pub const BLOCK_INTERFACE_DESCRIPTION: u32 = 0x0000_0001;
pub const BLOCK_OBSOLETE_PACKET: u32 = 0x0000_0002;
pub const BLOCK_SIMPLE_PACKET: u32 = 0x0000_0003;
pub const BLOCK_ENHANCED_PACKET: u32 = 0x0000_0006;

/// Section header byte-order magic, read in the section's own byte order.
pub const BYTE_ORDER_MAGIC: u32 = 0x1A2B_3C4D;

pub const IDB_LINKTYPE_RANGE: std::ops::Range<usize> = 0..2;
pub const IDB_SNAPLEN_RANGE: std::ops::Range<usize> = 4..8;
pub const IDB_OPTIONS_OFFSET: usize = 8;

pub const EPB_INTERFACE_RANGE: std::ops::Range<usize> = 0..4;
pub const EPB_TS_HIGH_RANGE: std::ops::Range<usize> = 4..8;
pub const EPB_TS_LOW_RANGE: std::ops::Range<usize> = 8..12;
pub const EPB_CAPLEN_RANGE: std::ops::Range<usize> = 12..16;
pub const EPB_ORIGLEN_RANGE: std::ops::Range<usize> = 16..20;
pub const EPB_DATA_OFFSET: usize = 20;

pub const SPB_ORIGLEN_RANGE: std::ops::Range<usize> = 0..4;
pub const SPB_DATA_OFFSET: usize = 4;

pub const OPB_INTERFACE_RANGE: std::ops::Range<usize> = 0..2;
pub const OPB_TS_HIGH_RANGE: std::ops::Range<usize> = 4..8;
pub const OPB_TS_LOW_RANGE: std::ops::Range<usize> = 8..12;
pub const OPB_CAPLEN_RANGE: std::ops::Range<usize> = 12..16;
pub const OPB_ORIGLEN_RANGE: std::ops::Range<usize> = 16..20;
pub const OPB_DATA_OFFSET: usize = 20;

pub const OPTION_HEADER_LEN: usize = 4;
pub const OPT_END_OF_OPT: u16 = 0;
pub const OPT_IF_NAME: u16 = 2;
pub const OPT_IF_DESCRIPTION: u16 = 3;
pub const OPT_IF_TSRESOL: u16 = 9;

/// `if_tsresol` default: microseconds.
pub const DEFAULT_TSRESOL: u8 = 6;
