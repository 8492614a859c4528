//! Crank self-test
//!
//! Runs the round-trip harness over the patient-data fixture with the
//! reference LZSS codec and exits non-zero if any size fails.
//!
//! ## Usage
//!
//! ```bash
//! # Defaults: sizes 4..256, window 8, lookahead 4
//! crank-selftest
//!
//! # From a config file, with a larger ladder
//! crank-selftest --config crank.toml --max-size 4096
//!
//! # Per-call tracing
//! RUST_LOG=crank_stream=trace crank-selftest
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crank::{
    Harness, HarnessConfig, LengthPolicy, LogIndicator, LzssCodec, PatientData, Result,
    RoundTripValidator, SizeLadder,
};

#[derive(Parser, Debug)]
#[command(name = "crank-selftest")]
#[command(author = "Daemoniorum LLC")]
#[command(version)]
#[command(about = "Round-trip self-test for streaming compression transducers", long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Fail on recovered-length mismatch instead of warning
    #[arg(long)]
    strict: bool,

    /// Warn on recovered-length mismatch, overriding the config file
    #[arg(long, conflicts_with = "strict")]
    advisory: bool,

    /// Upper bound (exclusive) of the size ladder
    #[arg(long)]
    max_size: Option<usize>,

    /// LZSS window size as a power of two
    #[arg(long)]
    window_bits: Option<u8>,

    /// LZSS lookahead size as a power of two
    #[arg(long)]
    lookahead_bits: Option<u8>,
}

impl Args {
    /// Load the config file, if any, and apply command-line overrides.
    fn harness_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if self.strict {
            config.length_policy = LengthPolicy::Strict;
        }
        if self.advisory {
            config.length_policy = LengthPolicy::Advisory;
        }
        if let Some(max_size) = self.max_size {
            config.ladder_end = max_size;
        }
        if let Some(window_bits) = self.window_bits {
            config.lzss.window_bits = window_bits;
        }
        if let Some(lookahead_bits) = self.lookahead_bits {
            config.lzss.lookahead_bits = lookahead_bits;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging, RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("Self-test could not start: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = args.harness_config()?;
    let codec = LzssCodec::new(config.lzss)?;
    let ladder = SizeLadder::from_config(&config)?;

    let validator = RoundTripValidator::new(codec, &config);
    let lzss = validator.factory().config();
    let encoder = validator.factory().encoder()?;
    let decoder = validator.factory().decoder()?;

    info!("Crank self-test");
    info!("  Input buffer size: {}", lzss.input_buffer_size);
    info!("  Window bits:       {}", lzss.window_bits);
    info!("  Lookahead bits:    {}", lzss.lookahead_bits);
    info!("  Encoder state:     {} bytes", encoder.memory_footprint());
    info!("  Decoder state:     {} bytes", decoder.memory_footprint());
    let policy = validator.length_policy();

    let harness = Harness::new(validator, PatientData, LogIndicator).with_ladder(ladder);
    let sizes: Vec<usize> = harness.ladder().iter().collect();
    info!(
        "  Sizes:             {:?} (margin {}, {:?})",
        sizes,
        config.margin,
        policy
    );

    let outcome = harness.run();
    let summary = outcome.summary();

    if let Some(fault) = outcome.fault() {
        error!("Halted: {}", fault);
        error!("{}", summary);
        return Ok(ExitCode::FAILURE);
    }

    if summary.warnings > 0 {
        warn!("{}", summary);
    } else {
        info!("{}", summary);
    }
    info!("All sizes passed");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_file(name: &str, text: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("crank-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, text).unwrap();
        path
    }

    fn parse(path: &std::path::Path, extra: &[&str]) -> Args {
        let mut argv = vec!["crank-selftest", "--config", path.to_str().unwrap()];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flag_corrects_file_value() {
        let path = config_file("window", "[lzss]\nwindow_bits = 20\n");

        let rejected = parse(&path, &[]).harness_config();
        let corrected = parse(&path, &["--window-bits", "10"]).harness_config();
        std::fs::remove_file(&path).unwrap();

        assert!(rejected.is_err());
        assert_eq!(corrected.unwrap().lzss.window_bits, 10);
    }

    #[test]
    fn test_advisory_overrides_strict_file() {
        let path = config_file("policy", "length_policy = \"strict\"\n");

        let from_file = parse(&path, &[]).harness_config();
        let overridden = parse(&path, &["--advisory"]).harness_config();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(from_file.unwrap().length_policy, LengthPolicy::Strict);
        assert_eq!(overridden.unwrap().length_policy, LengthPolicy::Advisory);
    }

    #[test]
    fn test_strict_and_advisory_conflict() {
        assert!(Args::try_parse_from(["crank-selftest", "--strict", "--advisory"]).is_err());
    }

    #[test]
    fn test_overrides_without_file() {
        let args = Args::try_parse_from(["crank-selftest", "--strict", "--max-size", "64"]).unwrap();
        let config = args.harness_config().unwrap();

        assert_eq!(config.length_policy, LengthPolicy::Strict);
        assert_eq!(config.ladder_end, 64);
    }
}
