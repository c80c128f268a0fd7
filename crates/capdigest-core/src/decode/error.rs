use std::fmt;

use etherparse::err::LenError;
use thiserror::Error;

/// Protocol layers the decoder knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Ethernet,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Icmp,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Ethernet => "Ethernet",
            LayerKind::Ipv4 => "IPv4",
            LayerKind::Ipv6 => "IPv6",
            LayerKind::Tcp => "TCP",
            LayerKind::Udp => "UDP",
            LayerKind::Icmp => "ICMP",
        };
        f.write_str(name)
    }
}

/// Why decoding stopped at a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{layer} header too short: need {needed} bytes, got {actual}")]
    TooShort {
        layer: LayerKind,
        needed: usize,
        actual: usize,
    },
    #[error("invalid IPv4 header length (IHL {ihl})")]
    InvalidHeaderLength { ihl: u8 },
}

impl DecodeError {
    /// Map an etherparse slice length error onto the layer it was parsing.
    pub fn from_len_error(layer: LayerKind, err: LenError) -> Self {
        DecodeError::TooShort {
            layer,
            needed: err.required_len,
            actual: err.len,
        }
    }
}
