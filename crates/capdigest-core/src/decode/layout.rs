use std::ops::Range;

pub const ETHERNET_HEADER_LEN: usize = 14;

/// Ethernet header plus a minimal IPv4 header.
pub const IPV4_MIN_FRAME_LEN: usize = 34;
pub const IPV4_MIN_HEADER_LEN: usize = 20;
pub const IPV4_VERSION_IHL_OFFSET: usize = 0;
pub const IPV4_TOS_OFFSET: usize = 1;
pub const IPV4_TOTAL_LEN_RANGE: Range<usize> = 2..4;
pub const IPV4_IDENTIFICATION_RANGE: Range<usize> = 4..6;
pub const IPV4_FLAGS_FRAGMENT_RANGE: Range<usize> = 6..8;
pub const IPV4_TTL_OFFSET: usize = 8;
pub const IPV4_PROTOCOL_OFFSET: usize = 9;
pub const IPV4_CHECKSUM_RANGE: Range<usize> = 10..12;
pub const IPV4_SOURCE_RANGE: Range<usize> = 12..16;
pub const IPV4_DESTINATION_RANGE: Range<usize> = 16..20;

/// Ethernet header plus a fixed IPv6 header.
pub const IPV6_MIN_FRAME_LEN: usize = 54;

pub const TCP_HEADER_LEN: usize = 20;
pub const TCP_SOURCE_PORT_RANGE: Range<usize> = 0..2;
pub const TCP_DESTINATION_PORT_RANGE: Range<usize> = 2..4;
pub const TCP_SEQUENCE_RANGE: Range<usize> = 4..8;
pub const TCP_ACKNOWLEDGMENT_RANGE: Range<usize> = 8..12;
pub const TCP_DATA_OFFSET_OFFSET: usize = 12;
pub const TCP_FLAGS_OFFSET: usize = 13;
pub const TCP_WINDOW_RANGE: Range<usize> = 14..16;
pub const TCP_CHECKSUM_RANGE: Range<usize> = 16..18;
pub const TCP_URGENT_RANGE: Range<usize> = 18..20;

pub const UDP_HEADER_LEN: usize = 8;

pub const ICMP_HEADER_LEN: usize = 8;
pub const ICMP_TYPE_OFFSET: usize = 0;
pub const ICMP_CODE_OFFSET: usize = 1;
pub const ICMP_CHECKSUM_RANGE: Range<usize> = 2..4;
pub const ICMP_REST_RANGE: Range<usize> = 4..8;

/// Default number of application bytes kept for display.
pub const DEFAULT_PAYLOAD_PREVIEW: usize = 100;
