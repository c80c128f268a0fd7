#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use etherparse::PacketBuilder;

const LEGACY_MAGIC_MICRO: u32 = 0xa1b2_c3d4;
const PCAPNG_SECTION_HEADER: u32 = 0x0A0D_0D0A;
const PCAPNG_INTERFACE_DESCRIPTION: u32 = 1;
pub const PCAPNG_OBSOLETE_PACKET: u32 = 2;
pub const PCAPNG_SIMPLE_PACKET: u32 = 3;
pub const PCAPNG_ENHANCED_PACKET: u32 = 6;
const BYTE_ORDER_MAGIC: u32 = 0x1A2B_3C4D;
const LINKTYPE_ETHERNET: u16 = 1;

pub const SRC_MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
pub const DST_MAC: [u8; 6] = [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];

pub fn tcp_syn_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .tcp(1234, 80, 1000, 4096)
        .syn();
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn udp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4([192, 168, 1, 10], [192, 168, 1, 20], 32)
        .udp(5000, 6000);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

/// Little-endian, microsecond legacy capture with Ethernet link type.
pub fn legacy_capture(packets: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = legacy_global_header();
    for (ts_sec, ts_usec, frame) in packets {
        out.extend(legacy_record(*ts_sec, *ts_usec, frame));
    }
    out
}

pub fn legacy_global_header() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&LEGACY_MAGIC_MICRO.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&u32::from(LINKTYPE_ETHERNET).to_le_bytes());
    out
}

pub fn legacy_record(ts_sec: u32, ts_usec: u32, frame: &[u8]) -> Vec<u8> {
    let len = frame.len() as u32;
    let mut out = Vec::new();
    out.extend_from_slice(&ts_sec.to_le_bytes());
    out.extend_from_slice(&ts_usec.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(frame);
    out
}

/// Little-endian pcap-ng capture: one section, one interface, one EPB per
/// frame with microsecond ticks.
pub fn pcapng_capture(interface_name: Option<&str>, packets: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(pcapng_block(PCAPNG_SECTION_HEADER, &section_header_body()));
    out.extend(pcapng_block(
        PCAPNG_INTERFACE_DESCRIPTION,
        &interface_description_body(interface_name),
    ));
    for (ts_us, frame) in packets {
        out.extend(pcapng_block(
            PCAPNG_ENHANCED_PACKET,
            &enhanced_packet_body(0, *ts_us, frame),
        ));
    }
    out
}

pub fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_le_bytes());
    block.extend_from_slice(&total_len.to_le_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_le_bytes());
    block
}

pub fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&BYTE_ORDER_MAGIC.to_le_bytes());
    body.extend_from_slice(&1u16.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&(-1i64).to_le_bytes());
    body
}

pub fn interface_description_body(name: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&LINKTYPE_ETHERNET.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&65535u32.to_le_bytes());
    if let Some(name) = name {
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&(name.len() as u16).to_le_bytes());
        body.extend_from_slice(name.as_bytes());
        body.extend(std::iter::repeat(0u8).take(padding(name.len())));
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
    }
    body
}

pub fn enhanced_packet_body(interface_id: u32, ts_us: u64, frame: &[u8]) -> Vec<u8> {
    let cap_len = frame.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&interface_id.to_le_bytes());
    body.extend_from_slice(&((ts_us >> 32) as u32).to_le_bytes());
    body.extend_from_slice(&(ts_us as u32).to_le_bytes());
    body.extend_from_slice(&cap_len.to_le_bytes());
    body.extend_from_slice(&cap_len.to_le_bytes());
    body.extend_from_slice(frame);
    body.extend(std::iter::repeat(0u8).take(padding(frame.len())));
    body
}

pub fn simple_packet_body(frame: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(frame.len() as u32).to_le_bytes());
    body.extend_from_slice(frame);
    body.extend(std::iter::repeat(0u8).take(padding(frame.len())));
    body
}

pub fn obsolete_packet_body(interface_id: u16, ts_us: u64, frame: &[u8]) -> Vec<u8> {
    let cap_len = frame.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&interface_id.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&((ts_us >> 32) as u32).to_le_bytes());
    body.extend_from_slice(&(ts_us as u32).to_le_bytes());
    body.extend_from_slice(&cap_len.to_le_bytes());
    body.extend_from_slice(&cap_len.to_le_bytes());
    body.extend_from_slice(frame);
    body.extend(std::iter::repeat(0u8).take(padding(frame.len())));
    body
}

fn padding(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

/// Write `bytes` to a unique file under the system temp dir.
pub fn write_temp_capture(stem: &str, extension: &str, bytes: &[u8]) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("capdigest_{stem}_{unique}.{extension}"));
    fs::write(&path, bytes).unwrap();
    path
}
