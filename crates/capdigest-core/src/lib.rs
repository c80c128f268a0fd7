//! capdigest core library: capture files to bounded text summaries.
//!
//! A capture (legacy libpcap or pcap-ng) is classified from its magic bytes,
//! walked front to back by the matching source reader, and every packet is
//! decoded layer by layer (Ethernet, IPv4/IPv6, TCP/UDP/ICMP, payload) into a
//! fixed-shape text entry. Reading stops at end of stream, at the packet cap,
//! or at the first fatal structural error; in the last case the entries
//! already produced are handed back with the error.
//!
//! Invariants:
//! - Output is a pure function of the file bytes and the options.
//! - At most `SummaryOptions::max_packets` entries, whatever the block mix.
//! - All parse state lives in one reader value; no process-wide state.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use capdigest_core::{SummaryOptions, summarize_capture_file};
//!
//! let summary = summarize_capture_file(Path::new("capture.pcapng"), SummaryOptions::default())?;
//! println!("{}", summary.text);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod decode;
mod render;
mod source;
mod summary;

pub use decode::{
    DecodeError, DecodedPacket, EthernetHeader, IcmpHeader, Ipv4Header, Layer, LayerKind,
    TcpHeader, UdpHeader, decode_packet,
};
pub use render::{format_mac, format_payload, format_tcp_flags, render_layers};
pub use source::{
    CaptureError, CaptureFile, CaptureFormat, Endianness, GlobalHeader, InterfaceInfo,
    LegacyPcapReader, PacketRecord, PacketSource, PcapNgReader, SkipReason, TimeResolution,
    Timestamp, detect_format,
};
pub use summary::{
    SummaryBuilder, SummaryError, summarize_bytes, summarize_capture_file, summarize_reader,
    summarize_source,
};

/// Default global packet cap.
pub const DEFAULT_MAX_PACKETS: usize = 100;
/// Default number of application bytes shown per packet.
pub const DEFAULT_PAYLOAD_PREVIEW_BYTES: usize = decode::layout::DEFAULT_PAYLOAD_PREVIEW;

/// Knobs for one summarization run.
///
/// # Examples
/// ```
/// use capdigest_core::SummaryOptions;
///
/// let options = SummaryOptions::default();
/// assert_eq!(options.max_packets, 100);
/// assert_eq!(options.payload_preview_bytes, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Maximum number of packet entries, across all record/block types.
    pub max_packets: usize,
    /// Application bytes kept per packet before formatting.
    pub payload_preview_bytes: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            max_packets: DEFAULT_MAX_PACKETS,
            payload_preview_bytes: DEFAULT_PAYLOAD_PREVIEW_BYTES,
        }
    }
}

/// Result of summarizing one capture.
///
/// `text` is the authoritative output; the other fields describe how it was
/// produced.
///
/// # Examples
/// ```
/// use capdigest_core::{SummaryOptions, summarize_bytes};
///
/// let mut capture = vec![0xd4, 0xc3, 0xb2, 0xa1];
/// capture.extend_from_slice(&[0u8; 20]);
/// let summary = summarize_bytes(&capture, SummaryOptions::default()).unwrap();
/// assert_eq!(summary.format, "pcap");
/// assert_eq!(summary.packets, 0);
/// assert!(summary.text.contains("Processing PCAP format file"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// `"pcap"` or `"pcapng"`.
    pub format: String,
    /// Packet entries appended to `text`.
    pub packets: usize,
    /// Records or blocks dropped for soft reasons (truncated payload, unknown
    /// or undersized block).
    pub skipped_blocks: u64,
    /// Link type from the legacy global header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_type: Option<i32>,
    /// Interfaces described by pcap-ng Interface Description Blocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceInfo>,
    /// Human-readable summary.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_omits_optional_fields_when_empty() {
        let summary = Summary {
            format: "pcap".to_string(),
            packets: 0,
            skipped_blocks: 0,
            link_type: None,
            interfaces: vec![],
            text: "Processing PCAP format file\n\n".to_string(),
        };

        let value = serde_json::to_value(&summary).expect("summary json");
        assert!(value.get("link_type").is_none());
        assert!(value.get("interfaces").is_none());
        assert_eq!(value["packets"], 0);
    }

    #[test]
    fn interface_optionals_are_skipped() {
        let summary = Summary {
            format: "pcapng".to_string(),
            packets: 1,
            skipped_blocks: 0,
            link_type: None,
            interfaces: vec![InterfaceInfo {
                link_type: 1,
                snap_len: 65535,
                name: Some("eth0".to_string()),
                description: None,
                time_resolution: None,
            }],
            text: String::new(),
        };

        let value = serde_json::to_value(&summary).expect("summary json");
        let iface = &value["interfaces"][0];
        assert_eq!(iface["name"], "eth0");
        assert!(iface.get("description").is_none());
        assert!(iface.get("time_resolution").is_none());

        let back: Summary = serde_json::from_value(value).expect("round trip");
        assert_eq!(back, summary);
    }
}
