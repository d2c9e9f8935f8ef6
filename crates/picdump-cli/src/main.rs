/// picdump: decode particle-in-cell simulation dumps and export the
/// datasets as plot-ready text and VTK files.
///
/// # Command overview
///
/// ```text
/// picdump <COMMAND> [OPTIONS]
///
/// Commands:
///   convert    Decode snapshots and export the selected datasets
///   inspect    Print the decoded simulation configuration
///   validate   Decode snapshots without exporting and report problems
///   init-plot  Write the default plot selection file
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Debug logging (per-record decode detail)
///   -q, --quiet      Warnings and errors only
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                                |
/// |------|--------------------------------------------------------|
/// | 0    | Success, including runs where single exports failed    |
/// | 1    | Fatal error (I/O, truncated stream, schema desync)     |
///
/// Logs and error details go to stderr so stdout can be piped cleanly.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use picdump_decoder::{ConfigDecoder, DecodeError, DecoderOptions, SnapshotDecoder};
use picdump_types::SimulationConfig;
use picdump_wire::TrailerCheck;
use tracing_subscriber::EnvFilter;

mod cmd_convert;
mod cmd_init_plot;
mod cmd_inspect;
mod cmd_validate;

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "picdump", version, about = "PIC simulation dump decoder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log every decoded record.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Decode snapshots and export the datasets selected in the plot file.
    Convert(ConvertArgs),
    /// Print the decoded simulation configuration and derived constants.
    Inspect(InspectArgs),
    /// Decode snapshots without exporting anything.
    Validate(ValidateArgs),
    /// Write the default plot selection file.
    InitPlot(InitPlotArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Decoder knobs shared by every command that reads dump files.
///
/// ```text
/// ┌───────────────────┬──────────────────────────────────────────────┐
/// │ Flag              │ Effect                                       │
/// ├───────────────────┼──────────────────────────────────────────────┤
/// │ --trailer         │ ignore | warn (default) | strict             │
/// │ --max-chunk-bytes │ reject chunks declaring a larger length      │
/// └───────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DecodeFlags {
    /// How to treat a chunk trailer that disagrees with its header.
    #[arg(long, default_value = "warn", value_parser = parse_trailer)]
    pub trailer: TrailerCheck,

    /// Largest chunk length accepted, in bytes.
    #[arg(long)]
    pub max_chunk_bytes: Option<usize>,
}

impl DecodeFlags {
    pub fn options(&self) -> DecoderOptions {
        let options = DecoderOptions::default().with_trailer_check(self.trailer);
        match self.max_chunk_bytes {
            Some(max) => options.with_max_chunk_len(max),
            None => options,
        }
    }
}

fn parse_trailer(s: &str) -> Result<TrailerCheck, String> {
    match s {
        "ignore" => Ok(TrailerCheck::Ignore),
        "warn" => Ok(TrailerCheck::Warn),
        "strict" => Ok(TrailerCheck::Strict),
        other => Err(format!("expected ignore, warn or strict, got {other:?}")),
    }
}

/// Arguments for `picdump convert`.
///
/// Snapshot files are decoded in the order given. Timestep numbering
/// continues across files, so a run split over `snap0001.dat` and
/// `snap0002.dat` exports one gap-free sequence.
#[derive(clap::Args)]
pub struct ConvertArgs {
    /// Snapshot files, decoded in order.
    #[arg(default_value = "snap0001.dat")]
    pub snapshots: Vec<PathBuf>,

    /// Configuration file written at simulation start.
    #[arg(short, long, default_value = "gfin.dat")]
    pub config: PathBuf,

    /// Plot selection; created with defaults when missing.
    #[arg(short, long, default_value = "plot.json")]
    pub plot: PathBuf,

    #[command(flatten)]
    pub decode: DecodeFlags,
}

/// Arguments for `picdump inspect`.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Configuration file to decode.
    #[arg(default_value = "gfin.dat")]
    pub config: PathBuf,

    /// Print every decoded field instead of the summary.
    #[arg(long)]
    pub full: bool,

    #[command(flatten)]
    pub decode: DecodeFlags,
}

/// Arguments for `picdump validate`.
///
/// Decodes the configuration and every snapshot completely, then prints
/// `✓` lines on success or a single `✗` diagnostic naming the timestep
/// and record where decoding stopped.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Snapshot files to check.
    #[arg(required = true)]
    pub snapshots: Vec<PathBuf>,

    /// Configuration file written at simulation start.
    #[arg(short, long, default_value = "gfin.dat")]
    pub config: PathBuf,

    #[command(flatten)]
    pub decode: DecodeFlags,
}

/// Arguments for `picdump init-plot`.
#[derive(clap::Args)]
pub struct InitPlotArgs {
    /// Where to write the selection.
    #[arg(default_value = "plot.json")]
    pub path: PathBuf,

    /// Replace an existing file.
    #[arg(long)]
    pub force: bool,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Open and decode a configuration file.
pub fn load_config(path: &Path, options: DecoderOptions) -> Result<SimulationConfig> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    ConfigDecoder::with_options(options)
        .decode(BufReader::new(file))
        .with_context(|| format!("failed to decode {}", path.display()))
}

/// Describe where snapshot decoding stopped.
///
/// ```text
/// snap0001.dat: stopped in timestep 3 at record "Ion_Density species 1"
/// (last completed timestep: 2)
/// ```
pub fn stopped_at<R: Read>(path: &Path, decoder: &SnapshotDecoder<R>) -> String {
    let last = match decoder.next_index().checked_sub(1) {
        Some(index) if decoder.timesteps_completed() > 0 => index.to_string(),
        _ => "none".to_string(),
    };
    format!(
        "{}: stopped in timestep {} at record {:?} (last completed timestep: {last})",
        path.display(),
        decoder.next_index(),
        decoder.last_record(),
    )
}

/// Attach the decoder position to a fatal decode error.
pub fn decode_failure<R: Read>(
    error: DecodeError,
    path: &Path,
    decoder: &SnapshotDecoder<R>,
) -> anyhow::Error {
    anyhow::Error::new(error).context(stopped_at(path, decoder))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Convert(args) => cmd_convert::run(&args, cli.quiet),
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::InitPlot(args) => cmd_init_plot::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
