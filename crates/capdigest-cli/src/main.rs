use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use capdigest_core::{
    CaptureError, DEFAULT_MAX_PACKETS, DEFAULT_PAYLOAD_PREVIEW_BYTES, Summary, SummaryError,
    SummaryOptions, summarize_capture_file,
};
use clap::{ArgAction, Parser};
use glob::glob;
use tracing::{debug, info, warn};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

const INPUT_EXTENSIONS: [&str; 3] = ["pcap", "pcapng", "cap"];

#[derive(Parser, Debug)]
#[command(name = "capdigest")]
#[command(version)]
#[command(
    about = "Summarize a pcap / pcap-ng capture as bounded, human-readable text.",
    long_about = None,
    after_help = "Examples:\n  capdigest capture.pcapng\n  capdigest capture.pcap --json --pretty -o summary.json\n  capdigest 'captures/*.pcapng' --max-packets 20"
)]
struct Cli {
    /// Path or glob pattern for a .pcap, .pcapng or .cap file
    input: PathBuf,

    /// Write the summary to a file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Emit the structured JSON summary instead of plain text
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Maximum number of packet entries
    #[arg(long, default_value_t = DEFAULT_MAX_PACKETS)]
    max_packets: usize,

    /// Application bytes shown per packet
    #[arg(long, default_value_t = DEFAULT_PAYLOAD_PREVIEW_BYTES)]
    payload_bytes: usize,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match cmd_summarize(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

/// Log to stderr at a level picked from `-q` / `-v`.
fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        match cli.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(log_level)),
        )
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_summarize(cli: &Cli) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&cli.input)?;
    validate_input_file(&resolved_input)?;
    if let Some(output) = cli.output.as_deref() {
        ensure_distinct_output(&resolved_input, output)?;
    }

    let options = SummaryOptions {
        max_packets: cli.max_packets,
        payload_preview_bytes: cli.payload_bytes,
    };
    info!(
        input = %resolved_input.display(),
        max_packets = options.max_packets,
        "summarizing capture"
    );

    match summarize_capture_file(&resolved_input, options) {
        Ok(summary) => {
            write_output(cli, &summary)?;
            if let Some(output) = cli.output.as_ref() {
                if !cli.quiet {
                    eprintln!("OK: summary written -> {}", output.display());
                }
            }
            Ok(())
        }
        Err(SummaryError { error, partial }) => {
            if let Some(partial) = partial.as_ref() {
                warn!(packets = partial.packets, "writing partial summary");
                write_output(cli, partial)?;
            }
            let hint = error_hint(&error, partial.is_some());
            Err(CliError::new(
                format!("failed to summarize {}: {}", resolved_input.display(), error),
                hint,
            ))
        }
    }
}

fn error_hint(error: &CaptureError, has_partial: bool) -> Option<String> {
    match error {
        CaptureError::UnrecognizedFormat { .. } => {
            Some("expected a libpcap (.pcap) or pcap-ng (.pcapng) capture".to_string())
        }
        CaptureError::TruncatedHeader { .. } if has_partial => {
            Some("the capture looks cut short; entries before the damage were kept".to_string())
        }
        CaptureError::TruncatedHeader { .. } => {
            Some("the capture looks cut short or empty".to_string())
        }
        CaptureError::Io(_) => None,
    }
}

fn render_output(summary: &Summary, json: bool, pretty: bool) -> Result<String, CliError> {
    if !json {
        return Ok(summary.text.clone());
    }
    let rendered = if pretty {
        serde_json::to_string_pretty(summary)
    } else {
        serde_json::to_string(summary)
    };
    rendered
        .context("JSON serialization failed")
        .map_err(Into::into)
}

fn write_output(cli: &Cli, summary: &Summary) -> Result<(), CliError> {
    let rendered = render_output(summary, cli.json, cli.pretty)?;
    let Some(output) = cli.output.as_ref() else {
        print!("{}", rendered);
        return Ok(());
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(output, rendered)
        .with_context(|| format!("Failed to write summary: {}", output.display()))?;
    debug!(output = %output.display(), "summary written");
    Ok(())
}

fn ensure_distinct_output(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // The output directory may not exist yet; then it cannot hold the input.
    let Ok(output_dir) = fs::canonicalize(output_dir) else {
        return Ok(());
    };
    let file_name = output
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid output path: {}", output.display()))?;
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap, .pcapng or .cap file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap, .pcapng or .cap file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !INPUT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap, .pcapng or .cap file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap, .pcapng or .cap".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single capture file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
