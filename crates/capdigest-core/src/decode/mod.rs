//! Packet layer decoding.
//!
//! Follows the same split as the source readers:
//! - `layout`: byte offsets and ranges (source of truth)
//! - `reader`: bounds-checked, network-order field access
//! - `parser`: header structs and the layer walk
//! - `error`: why a layer could not be decoded
//!
//! Decoding is pure and never fails as a whole: the first layer that lacks
//! bytes is reported as `Layer::Incomplete` and nothing after it is tried.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::{DecodeError, LayerKind};
pub use parser::{
    DecodedPacket, EthernetHeader, IcmpHeader, Ipv4Header, Layer, TcpHeader, UdpHeader,
    decode_packet,
};
