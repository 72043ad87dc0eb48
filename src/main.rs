use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use basefind::{
    analyze_with_progress, input, logging, AnalysisConfig, BaseEstimate, Endianness,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EndianArg {
    Little,
    Big,
}

impl From<EndianArg> for Endianness {
    fn from(arg: EndianArg) -> Self {
        match arg {
            EndianArg::Little => Endianness::Little,
            EndianArg::Big => Endianness::Big,
        }
    }
}

/// Recover the probable base load address of a raw binary blob.
#[derive(Debug, Parser)]
#[command(name = "basefind", version)]
struct Cli {
    /// The file to analyze
    file: PathBuf,

    /// The minimum length of strings to look for, in unicode code points
    #[arg(short = 'n', long = "min-string-len", default_value_t = 5)]
    min_string_len: usize,

    /// The length of pointers to look for, in bytes (4 = 32-bit pointers)
    #[arg(short = 'w', long = "pointer-width", default_value_t = 8)]
    pointer_width: usize,

    /// The endianness of the pointers
    #[arg(short = 'e', long, value_enum, default_value_t = EndianArg::Little)]
    endianness: EndianArg,

    /// The alignment of the pointers (defaults to the pointer width)
    #[arg(short = 'a', long)]
    alignment: Option<usize>,

    /// Slack factor (higher = slower and more memory but more accurate)
    #[arg(short = 'f', long)]
    slack_factor: Option<f64>,

    /// Print the full analysis as JSON instead of a single offset line
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_tracing_json();
    } else {
        logging::init_tracing();
    }

    let config = AnalysisConfig {
        min_string_len: cli.min_string_len,
        pointer_width: cli.pointer_width,
        endianness: cli.endianness.into(),
        alignment: cli.alignment,
        slack_factor: cli.slack_factor,
    };

    let blob = input::load_blob(&cli.file)?;
    let bytes: &[u8] = blob.as_deref().unwrap_or(&[]);

    let progress = |done: usize, total: usize| {
        eprint!("\r{done}/{total}");
        let _ = std::io::stderr().flush();
    };
    let analysis = analyze_with_progress(bytes, &config, Some(&progress))?;
    if analysis.modulus_count > 0 {
        eprintln!();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("Offset: {}", analysis.estimate);
    }

    // Inconclusive is a completed run, surfaced with its own status.
    if analysis.estimate == BaseEstimate::Inconclusive {
        std::process::exit(2);
    }
    Ok(())
}
