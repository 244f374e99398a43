//! VeilQR: split a QR image into shares that must all be present to restore it
//!
//! # Usage
//!
//! ```bash
//! veilqr --config veilqr.toml protect --input code.png --out-dir shares/
//! veilqr --config veilqr.toml recover --shares shares/ --output restored.png --reference code.png
//! veilqr roundtrip   # protect + recover a generated test card in memory
//! veilqr bench       # time the payload cipher
//! ```

mod bench;
mod config;
mod pipeline;

use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use veilqr_verify::{align_for_comparison, QualityReport};

#[derive(Debug, PartialEq)]
enum Command {
    Protect {
        input: PathBuf,
        out_dir: PathBuf,
    },
    Recover {
        shares: PathBuf,
        output: PathBuf,
        reference: Option<PathBuf>,
    },
    Roundtrip {
        input: Option<PathBuf>,
    },
    Bench,
}

#[derive(Debug, PartialEq)]
enum Invocation {
    Help,
    Version,
    Run {
        config_path: PathBuf,
        validate_only: bool,
        command: Option<Command>,
    },
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let (config_path, validate_only, command) = match parse_args(&args)? {
        Invocation::Help => {
            print_help();
            return Ok(());
        }
        Invocation::Version => {
            println!("veilqr {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Invocation::Run {
            config_path,
            validate_only,
            command,
        } => (config_path, validate_only, command),
    };

    // Load config
    let mut config = config::Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Apply env overrides
    config.apply_env_overrides();

    // Validate
    config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    std::env::set_var("RUST_LOG", &config.logging.log_level);
    env_logger::init();

    if validate_only {
        println!("✅ Configuration is valid.");
        println!(
            "  Grid:           {0}x{0} blocks",
            config.scheme.grid
        );
        println!("  Shares:         {}", config.scheme.share_count);
        println!(
            "  Reference size: {0}x{0} px",
            config.scheme.reference_size
        );
        println!(
            "  Map params:     r = {}, s = {}",
            config.scheme.logistic_r, config.scheme.sine_s
        );
        println!(
            "  Passphrase:     {}",
            if config.secrets.passphrase.is_some() {
                "configured"
            } else {
                "derived from seed"
            }
        );
        return Ok(());
    }

    let Some(command) = command else {
        print_help();
        return Ok(());
    };

    match command {
        Command::Protect { input, out_dir } => run_protect(&config, &input, &out_dir),
        Command::Recover {
            shares,
            output,
            reference,
        } => run_recover(&config, &shares, &output, reference.as_deref()),
        Command::Roundtrip { input } => run_roundtrip(&config, input.as_deref()),
        Command::Bench => run_bench(&config),
    }
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Failed to open image {}", path.display()))
}

fn run_protect(config: &config::Config, input: &Path, out_dir: &Path) -> Result<()> {
    let pipeline = pipeline::Pipeline::from_config(config)?;
    let image = pipeline.prepare(&load_image(input)?);

    let shares = pipeline.protect(&image)?;
    let paths = pipeline::write_shares(out_dir, &shares)?;

    println!("Wrote {} shares:", paths.len());
    for path in &paths {
        println!("  {}", path.display());
    }
    println!("All {} shares are required to recover the image.", paths.len());
    Ok(())
}

fn run_recover(
    config: &config::Config,
    shares_dir: &Path,
    output: &Path,
    reference: Option<&Path>,
) -> Result<()> {
    let pipeline = pipeline::Pipeline::from_config(config)?;
    let shares = pipeline::read_shares(shares_dir)?;
    log::info!(
        "Found {} share files, expecting {}",
        shares.len(),
        pipeline.share_count()
    );

    let recovered = pipeline.recover(&shares)?;
    recovered
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Recovered image written to {}", output.display());

    if let Some(reference) = reference {
        let (original, candidate) = align_for_comparison(
            &load_image(reference)?,
            &DynamicImage::ImageLuma8(recovered),
        );
        let report = QualityReport::evaluate(&original, &candidate)
            .context("Failed to compare against reference")?;
        println!("{}", report);
    }
    Ok(())
}

fn run_roundtrip(config: &config::Config, input: Option<&Path>) -> Result<()> {
    let pipeline = pipeline::Pipeline::from_config(config)?;
    let image = match input {
        Some(path) => pipeline.prepare(&load_image(path)?),
        None => pipeline::test_card(config.scheme.reference_size),
    };

    let shares = pipeline.protect(&image)?;
    let recovered = pipeline.recover(&shares)?;
    let report = QualityReport::evaluate(&image, &recovered)
        .context("Failed to compare reconstruction")?;

    println!("{}", report);
    println!(
        "Lossless: {}",
        if report.is_lossless() { "yes" } else { "NO" }
    );
    println!();
    run_bench(config)?;

    anyhow::ensure!(report.is_lossless(), "round trip was not lossless");
    Ok(())
}

fn run_bench(config: &config::Config) -> Result<()> {
    let timing = bench::measure_cipher(
        config.passphrase(),
        config.bench.payload_bytes,
        config.bench.iterations,
    )?;
    println!("{}", timing);
    Ok(())
}

/// Minimal argument parsing: global options, then a command and its options.
fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut config_path = PathBuf::from("veilqr.toml");
    let mut validate_only = false;
    let mut command_name: Option<&str> = None;
    let mut options: Vec<(&str, PathBuf)> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--help" | "-h" => return Ok(Invocation::Help),
            "--version" | "-V" => return Ok(Invocation::Version),
            "--validate" => validate_only = true,
            "--config" | "-c" | "--input" | "--out-dir" | "--shares" | "--output"
            | "--reference" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    anyhow::bail!("{} requires a path argument", arg);
                };
                if matches!(arg, "--config" | "-c") {
                    config_path = PathBuf::from(value);
                } else {
                    options.push((arg, PathBuf::from(value)));
                }
            }
            "protect" | "recover" | "roundtrip" | "bench" if command_name.is_none() => {
                command_name = Some(arg);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
        i += 1;
    }

    let mut take = |name: &str| -> Option<PathBuf> {
        let pos = options.iter().position(|(flag, _)| *flag == name)?;
        Some(options.remove(pos).1)
    };

    let command = match command_name {
        None => None,
        Some("protect") => Some(Command::Protect {
            input: take("--input").context("protect requires --input <PNG>")?,
            out_dir: take("--out-dir").context("protect requires --out-dir <DIR>")?,
        }),
        Some("recover") => Some(Command::Recover {
            shares: take("--shares").context("recover requires --shares <DIR>")?,
            output: take("--output").context("recover requires --output <PNG>")?,
            reference: take("--reference"),
        }),
        Some("roundtrip") => Some(Command::Roundtrip {
            input: take("--input"),
        }),
        Some(_) => Some(Command::Bench),
    };

    if let Some((flag, _)) = options.first() {
        anyhow::bail!("{} is not valid here", flag);
    }

    Ok(Invocation::Run {
        config_path,
        validate_only,
        command,
    })
}

fn print_help() {
    println!(
        r#"VeilQR: all-or-nothing visual secret sharing for QR images

USAGE:
    veilqr [OPTIONS] <COMMAND>

COMMANDS:
    protect --input <PNG> --out-dir <DIR>
                          Scramble, encrypt and split an image into share files
    recover --shares <DIR> --output <PNG> [--reference <PNG>]
                          Combine every share file and restore the image
    roundtrip [--input <PNG>]
                          Protect and recover in memory, then report quality
    bench                 Time encryption and decryption of a random payload

OPTIONS:
    -c, --config <PATH>   Config file path (default: veilqr.toml, optional)
    --validate            Validate configuration and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    VEILQR_SEED             Seed phrase for the block permutation
    VEILQR_PASSPHRASE       Cipher passphrase (defaults to the seed)
    VEILQR_SHARE_COUNT      Number of shares (2-255)
    VEILQR_GRID             Blocks per image side
    VEILQR_REFERENCE_SIZE   Side in pixels inputs are resized to
    VEILQR_LOG_LEVEL        Log level (error/warn/info/debug/trace)

EXAMPLES:
    # Split a QR code into four shares
    VEILQR_SEED=test veilqr protect --input code.png --out-dir shares/

    # Restore it and compare against the original
    VEILQR_SEED=test veilqr recover --shares shares/ --output restored.png --reference code.png
"#
    );
}
