use std::io::{Cursor, Read, Seek};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::decode::decode_packet;
use crate::render::render_layers;
use crate::source::{CaptureError, CaptureFile, CaptureFormat, PacketRecord, PacketSource};
use crate::{Summary, SummaryOptions};

/// A fatal capture error, with whatever was summarized before it.
///
/// `partial` is `None` only when the format could not be determined.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SummaryError {
    pub error: CaptureError,
    pub partial: Option<Summary>,
}

impl SummaryError {
    fn without_summary(error: CaptureError) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

/// Accumulates per-packet text blocks up to `max_packets`.
pub struct SummaryBuilder {
    format: CaptureFormat,
    options: SummaryOptions,
    text: String,
    packets: usize,
}

impl SummaryBuilder {
    pub fn new(format: CaptureFormat, options: SummaryOptions) -> Self {
        let banner = match format {
            CaptureFormat::Legacy { .. } => "Processing PCAP format file",
            CaptureFormat::PcapNg => "Processing PCAP-NG format file",
        };
        Self {
            format,
            options,
            text: format!("{banner}\n\n"),
            packets: 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.packets >= self.options.max_packets
    }

    /// Append one packet entry. Returns `false` once the cap is reached.
    pub fn push(&mut self, record: &PacketRecord) -> bool {
        if self.is_full() {
            return false;
        }
        self.packets += 1;

        let out = &mut self.text;
        out.push_str(&format!("Packet {}:\n", self.packets));
        if let Some(ts) = record.timestamp {
            let rendered = ts
                .to_rfc3339()
                .unwrap_or_else(|| format!("{}.{:09}", ts.secs, ts.nanos));
            out.push_str(&format!("  Time: {rendered}\n"));
        }
        out.push_str(&format!("  Length: {} bytes\n", record.original_len));
        if let Some(id) = record.interface_id {
            out.push_str(&format!("  Interface ID: {id}\n"));
        }
        let decoded = decode_packet(&record.data, self.options.payload_preview_bytes);
        render_layers(&decoded, out);
        out.push('\n');
        true
    }

    pub fn finish<S: PacketSource + ?Sized>(self, source: &S) -> Summary {
        Summary {
            format: self.format.name().to_string(),
            packets: self.packets,
            skipped_blocks: source.skipped_blocks(),
            link_type: source.link_type().map(|lt| lt.0),
            interfaces: source.interfaces().to_vec(),
            text: self.text,
        }
    }
}

/// Drain `source` into a summary, stopping at the packet cap.
pub fn summarize_source<S: PacketSource + ?Sized>(
    format: CaptureFormat,
    source: &mut S,
    options: SummaryOptions,
) -> Result<Summary, SummaryError> {
    let mut builder = SummaryBuilder::new(format, options);
    while !builder.is_full() {
        match source.next_packet() {
            Ok(Some(record)) => {
                builder.push(&record);
            }
            Ok(None) => break,
            Err(error) => {
                return Err(SummaryError {
                    error,
                    partial: Some(builder.finish(&*source)),
                });
            }
        }
    }
    if builder.is_full() {
        debug!(max_packets = options.max_packets, "packet cap reached");
    }
    let summary = builder.finish(&*source);
    info!(
        format = %summary.format,
        packets = summary.packets,
        skipped = summary.skipped_blocks,
        "capture summarized"
    );
    Ok(summary)
}

/// Summarize any seekable stream holding a capture.
pub fn summarize_reader<R: Read + Seek>(
    reader: R,
    options: SummaryOptions,
) -> Result<Summary, SummaryError> {
    let mut capture = CaptureFile::from_reader(reader).map_err(SummaryError::without_summary)?;
    let format = capture.format();
    summarize_source(format, &mut capture, options)
}

/// Summarize capture bytes already in memory.
pub fn summarize_bytes(bytes: &[u8], options: SummaryOptions) -> Result<Summary, SummaryError> {
    summarize_reader(Cursor::new(bytes), options)
}

/// Open and summarize a capture file. The file is closed on every path.
pub fn summarize_capture_file(
    path: &Path,
    options: SummaryOptions,
) -> Result<Summary, SummaryError> {
    let mut capture = CaptureFile::open(path).map_err(SummaryError::without_summary)?;
    let format = capture.format();
    summarize_source(format, &mut capture, options)
}
