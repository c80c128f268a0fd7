//! Text rendering of decoded layers.

use crate::decode::{DecodeError, DecodedPacket, Layer, LayerKind};

const TCP_FLAG_NAMES: [(u8, &str); 8] = [
    (0x01, "FIN"),
    (0x02, "SYN"),
    (0x04, "RST"),
    (0x08, "PSH"),
    (0x10, "ACK"),
    (0x20, "URG"),
    (0x40, "ECE"),
    (0x80, "CWR"),
];

const HEX_BYTES_PER_LINE: usize = 16;
const PAYLOAD_INDENT: &str = "    ";

/// Append the layer lines of one packet.
pub fn render_layers(packet: &DecodedPacket, out: &mut String) {
    for layer in &packet.layers {
        render_layer(layer, out);
    }
}

fn render_layer(layer: &Layer, out: &mut String) {
    let lines = match layer {
        Layer::Ethernet(eth) => format!(
            "  Layer: Ethernet\n    Ethernet: {} -> {}\n    EtherType: 0x{:04x}",
            format_mac(&eth.source),
            format_mac(&eth.destination),
            eth.ether_type
        ),
        Layer::Ipv4(ip) => format!(
            "  Layer: IPv4\n    IPv4: {} -> {}\n    Protocol: {}\n    TTL: {}",
            ip.source, ip.destination, ip.protocol, ip.ttl
        ),
        Layer::Ipv6 => "  Layer: IPv6\n    IPv6 details not fully parsed".to_string(),
        Layer::Tcp(tcp) => format!(
            "  Layer: TCP\n    TCP: {} -> {}\n    Flags: {}\n    Seq: {}, Ack: {}",
            tcp.source_port,
            tcp.destination_port,
            format_tcp_flags(tcp.flags),
            tcp.sequence,
            tcp.acknowledgment
        ),
        Layer::Udp(udp) => format!(
            "  Layer: UDP\n    UDP: {} -> {}\n    Length: {}",
            udp.source_port, udp.destination_port, udp.length
        ),
        Layer::Icmp(icmp) => format!(
            "  Layer: ICMP\n    ICMP Type: {}, Code: {}",
            icmp.icmp_type, icmp.code
        ),
        Layer::Payload(bytes) => format!(
            "  Application Data:\n{PAYLOAD_INDENT}{}",
            format_payload(bytes)
        ),
        Layer::Incomplete(err) => format!("  {}", incomplete_marker(err)),
    };
    out.push_str(&lines);
    out.push('\n');
}

fn incomplete_marker(err: &DecodeError) -> String {
    match err {
        DecodeError::TooShort {
            layer: LayerKind::Ethernet,
            ..
        } => "Incomplete packet (too short for Ethernet header)".to_string(),
        DecodeError::TooShort { layer, .. } => format!("Incomplete {layer} header"),
        DecodeError::InvalidHeaderLength { .. } => err.to_string(),
    }
}

/// Lowercase, colon-separated MAC address.
pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Set TCP flags joined by ", ", or `None` when no bit is set.
pub fn format_tcp_flags(flags: u8) -> String {
    let names: Vec<&str> = TCP_FLAG_NAMES
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        return "None".to_string();
    }
    names.join(", ")
}

/// Printable ASCII as literal text, anything else as hex pairs wrapped every
/// 16 bytes onto an indented continuation line.
pub fn format_payload(payload: &[u8]) -> String {
    if payload.iter().all(|byte| (32..=126).contains(byte)) {
        return String::from_utf8_lossy(payload).into_owned();
    }
    let mut hex = String::with_capacity(payload.len() * 3);
    for (idx, byte) in payload.iter().enumerate() {
        if idx > 0 && idx % HEX_BYTES_PER_LINE == 0 {
            hex.push('\n');
            hex.push_str(PAYLOAD_INDENT);
        } else if idx > 0 {
            hex.push(' ');
        }
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::{format_mac, format_payload, format_tcp_flags, render_layers};
    use crate::decode::decode_packet;

    #[test]
    fn printable_payload_is_literal() {
        assert_eq!(format_payload(&[0x68, 0x69]), "hi");
    }

    #[test]
    fn binary_payload_is_hex() {
        assert_eq!(format_payload(&[0x00, 0x01]), "00 01");
    }

    #[test]
    fn hex_wraps_every_sixteen_bytes() {
        let bytes: Vec<u8> = (0u8..18).collect();
        assert_eq!(
            format_payload(&bytes),
            "00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\n    10 11"
        );
    }

    #[test]
    fn tcp_flags_are_named() {
        assert_eq!(format_tcp_flags(0x02), "SYN");
        assert_eq!(format_tcp_flags(0x12), "SYN, ACK");
        assert_eq!(format_tcp_flags(0x00), "None");
        assert_eq!(
            format_tcp_flags(0xff),
            "FIN, SYN, RST, PSH, ACK, URG, ECE, CWR"
        );
    }

    #[test]
    fn mac_is_lowercase() {
        assert_eq!(
            format_mac(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            "aa:bb:cc:dd:ee:ff"
        );
    }

    #[test]
    fn short_packet_renders_marker() {
        let mut out = String::new();
        render_layers(&decode_packet(&[0u8; 4], 100), &mut out);
        assert_eq!(
            out,
            "  Incomplete packet (too short for Ethernet header)\n"
        );
    }

    #[test]
    fn udp_packet_renders_each_layer_block() {
        let builder = etherparse::PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 5)
            .udp(53, 4000);
        let mut frame = Vec::with_capacity(builder.size(2));
        builder.write(&mut frame, &[0x00, 0xff]).unwrap();
        let mut out = String::new();
        render_layers(&decode_packet(&frame, 100), &mut out);
        assert_eq!(
            out,
            "  Layer: Ethernet\n    Ethernet: 02:00:00:00:00:01 -> 02:00:00:00:00:02\n    EtherType: 0x0800\n\
             \x20 Layer: IPv4\n    IPv4: 10.0.0.1 -> 10.0.0.2\n    Protocol: 17\n    TTL: 5\n\
             \x20 Layer: UDP\n    UDP: 53 -> 4000\n    Length: 10\n\
             \x20 Application Data:\n    00 ff\n"
        );
    }

    #[test]
    fn arp_frame_renders_ethernet_only() {
        let mut frame = vec![0u8; 42];
        frame[..6].copy_from_slice(&[0xff; 6]);
        frame[6..12].copy_from_slice(&[0x02, 0, 0, 0, 0, 1]);
        frame[12] = 0x08;
        frame[13] = 0x06;
        let mut out = String::new();
        render_layers(&decode_packet(&frame, 100), &mut out);
        assert_eq!(
            out,
            "  Layer: Ethernet\n    Ethernet: 02:00:00:00:00:01 -> ff:ff:ff:ff:ff:ff\n    EtherType: 0x0806\n"
        );
    }
}
