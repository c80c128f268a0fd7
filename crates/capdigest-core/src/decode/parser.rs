use std::net::Ipv4Addr;

use etherparse::{EtherType, Ethernet2HeaderSlice, Icmpv4Slice, IpNumber, UdpHeaderSlice};

use super::error::{DecodeError, LayerKind};
use super::layout;
use super::reader::LayerReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub destination: [u8; 6],
    pub source: [u8; 6],
    pub ether_type: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    /// Header length in bytes (IHL * 4).
    pub header_len: usize,
    pub tos: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence: u32,
    pub acknowledgment: u32,
    /// Header length in bytes (data offset * 4).
    pub header_len: usize,
    pub flags: u8,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub length: u16,
    pub checksum: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub rest: u32,
}

/// One decoded layer, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    Ethernet(EthernetHeader),
    Ipv4(Ipv4Header),
    /// IPv6 is recognized but its fields are not decoded.
    Ipv6,
    Tcp(TcpHeader),
    Udp(UdpHeader),
    Icmp(IcmpHeader),
    /// Leading application bytes, already cut to the preview size.
    Payload(Vec<u8>),
    /// Decoding stopped here.
    Incomplete(DecodeError),
}

/// Ordered layer decode of one packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPacket {
    pub layers: Vec<Layer>,
}

/// Decode Ethernet, then IPv4/IPv6, then TCP/UDP/ICMP, then the payload.
///
/// Never fails: a layer without enough bytes becomes `Layer::Incomplete` and
/// ends the decode. `payload_preview` caps the application bytes kept.
pub fn decode_packet(data: &[u8], payload_preview: usize) -> DecodedPacket {
    let mut layers = Vec::new();
    if let Err(err) = decode_layers(data, payload_preview, &mut layers) {
        layers.push(Layer::Incomplete(err));
    }
    DecodedPacket { layers }
}

fn decode_layers(
    data: &[u8],
    payload_preview: usize,
    layers: &mut Vec<Layer>,
) -> Result<(), DecodeError> {
    let ethernet = parse_ethernet(data)?;
    layers.push(Layer::Ethernet(ethernet));

    let ether_type = EtherType(ethernet.ether_type);
    if ether_type == EtherType::IPV4 {
        let ipv4 = parse_ipv4(data)?;
        layers.push(Layer::Ipv4(ipv4));
        let transport_offset = layout::ETHERNET_HEADER_LEN + ipv4.header_len;
        decode_transport(data, ipv4.protocol, transport_offset, payload_preview, layers)
    } else if ether_type == EtherType::IPV6 {
        LayerReader::new(LayerKind::Ipv6, data).require_len(layout::IPV6_MIN_FRAME_LEN)?;
        layers.push(Layer::Ipv6);
        Ok(())
    } else {
        Ok(())
    }
}

fn decode_transport(
    data: &[u8],
    protocol: u8,
    offset: usize,
    payload_preview: usize,
    layers: &mut Vec<Layer>,
) -> Result<(), DecodeError> {
    let segment = data.get(offset..).unwrap_or(&[]);
    let protocol = IpNumber(protocol);
    let payload_offset = if protocol == IpNumber::TCP {
        let tcp = parse_tcp(segment)?;
        layers.push(Layer::Tcp(tcp));
        tcp.header_len
    } else if protocol == IpNumber::UDP {
        let udp = parse_udp(segment)?;
        layers.push(Layer::Udp(udp));
        layout::UDP_HEADER_LEN
    } else if protocol == IpNumber::ICMP {
        layers.push(Layer::Icmp(parse_icmp(segment)?));
        return Ok(());
    } else {
        return Ok(());
    };

    let payload = segment.get(payload_offset..).unwrap_or(&[]);
    let preview = &payload[..payload.len().min(payload_preview)];
    if !preview.is_empty() {
        layers.push(Layer::Payload(preview.to_vec()));
    }
    Ok(())
}

pub fn parse_ethernet(data: &[u8]) -> Result<EthernetHeader, DecodeError> {
    let slice = Ethernet2HeaderSlice::from_slice(data)
        .map_err(|err| DecodeError::from_len_error(LayerKind::Ethernet, err))?;
    Ok(EthernetHeader {
        destination: slice.destination(),
        source: slice.source(),
        ether_type: slice.ether_type().0,
    })
}

/// Parse the IPv4 header following a 14-byte Ethernet header in `frame`.
pub fn parse_ipv4(frame: &[u8]) -> Result<Ipv4Header, DecodeError> {
    LayerReader::new(LayerKind::Ipv4, frame).require_len(layout::IPV4_MIN_FRAME_LEN)?;
    let packet = frame.get(layout::ETHERNET_HEADER_LEN..).unwrap_or(&[]);
    let reader = LayerReader::new(LayerKind::Ipv4, packet);

    let version_ihl = reader.read_u8(layout::IPV4_VERSION_IHL_OFFSET)?;
    let ihl = version_ihl & 0x0f;
    let header_len = usize::from(ihl) * 4;
    if header_len < layout::IPV4_MIN_HEADER_LEN {
        return Err(DecodeError::InvalidHeaderLength { ihl });
    }
    reader.require_len(header_len)?;

    Ok(Ipv4Header {
        version: version_ihl >> 4,
        header_len,
        tos: reader.read_u8(layout::IPV4_TOS_OFFSET)?,
        total_length: reader.read_u16_be(layout::IPV4_TOTAL_LEN_RANGE)?,
        identification: reader.read_u16_be(layout::IPV4_IDENTIFICATION_RANGE)?,
        flags_fragment: reader.read_u16_be(layout::IPV4_FLAGS_FRAGMENT_RANGE)?,
        ttl: reader.read_u8(layout::IPV4_TTL_OFFSET)?,
        protocol: reader.read_u8(layout::IPV4_PROTOCOL_OFFSET)?,
        checksum: reader.read_u16_be(layout::IPV4_CHECKSUM_RANGE)?,
        source: Ipv4Addr::from(reader.read_array::<4>(layout::IPV4_SOURCE_RANGE)?),
        destination: Ipv4Addr::from(reader.read_array::<4>(layout::IPV4_DESTINATION_RANGE)?),
    })
}

pub fn parse_tcp(segment: &[u8]) -> Result<TcpHeader, DecodeError> {
    let reader = LayerReader::new(LayerKind::Tcp, segment);
    reader.require_len(layout::TCP_HEADER_LEN)?;
    Ok(TcpHeader {
        source_port: reader.read_u16_be(layout::TCP_SOURCE_PORT_RANGE)?,
        destination_port: reader.read_u16_be(layout::TCP_DESTINATION_PORT_RANGE)?,
        sequence: reader.read_u32_be(layout::TCP_SEQUENCE_RANGE)?,
        acknowledgment: reader.read_u32_be(layout::TCP_ACKNOWLEDGMENT_RANGE)?,
        header_len: usize::from(reader.read_u8(layout::TCP_DATA_OFFSET_OFFSET)? >> 4) * 4,
        flags: reader.read_u8(layout::TCP_FLAGS_OFFSET)?,
        window: reader.read_u16_be(layout::TCP_WINDOW_RANGE)?,
        checksum: reader.read_u16_be(layout::TCP_CHECKSUM_RANGE)?,
        urgent_pointer: reader.read_u16_be(layout::TCP_URGENT_RANGE)?,
    })
}

pub fn parse_udp(segment: &[u8]) -> Result<UdpHeader, DecodeError> {
    let slice = UdpHeaderSlice::from_slice(segment)
        .map_err(|err| DecodeError::from_len_error(LayerKind::Udp, err))?;
    Ok(UdpHeader {
        source_port: slice.source_port(),
        destination_port: slice.destination_port(),
        length: slice.length(),
        checksum: slice.checksum(),
    })
}

/// ICMP needs only its 8-byte fixed header. etherparse additionally rejects
/// timestamp messages (type 13/14, code 0) that are not exactly 20 bytes, so
/// those fall back to reading the fixed header directly.
pub fn parse_icmp(segment: &[u8]) -> Result<IcmpHeader, DecodeError> {
    match Icmpv4Slice::from_slice(segment) {
        Ok(slice) => Ok(IcmpHeader {
            icmp_type: slice.type_u8(),
            code: slice.code_u8(),
            checksum: slice.checksum(),
            rest: u32::from_be_bytes(slice.bytes5to8()),
        }),
        Err(err) if err.len < layout::ICMP_HEADER_LEN => {
            Err(DecodeError::from_len_error(LayerKind::Icmp, err))
        }
        Err(_) => {
            let reader = LayerReader::new(LayerKind::Icmp, segment);
            Ok(IcmpHeader {
                icmp_type: reader.read_u8(layout::ICMP_TYPE_OFFSET)?,
                code: reader.read_u8(layout::ICMP_CODE_OFFSET)?,
                checksum: reader.read_u16_be(layout::ICMP_CHECKSUM_RANGE)?,
                rest: reader.read_u32_be(layout::ICMP_REST_RANGE)?,
            })
        }
    }
}
