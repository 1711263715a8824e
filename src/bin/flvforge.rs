// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # flvforge CLI
//!
//! ## Usage
//!
//! ```sh
//! # Print regenerated metadata
//! flvforge info input.flv --keys duration,keyframes
//!
//! # Print frames between 1s and 2s
//! flvforge dump input.flv --min-dts 1000 --max-dts 2000
//!
//! # Repair a damaged file and rebuild its keyframe index
//! flvforge rewrite input.flv output.flv --recover --fix-dts --update-keyframes
//!
//! # Separate audio and video
//! flvforge split input.flv --outc video:v.flv,audio:a.flv
//!
//! # Join files
//! flvforge concat -o joined.flv a.flv b.flv
//! ```

mod cmd;
mod common;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use cmd::{ConcatCmd, DumpCmd, InfoCmd, RewriteCmd, SplitCmd};
use common::Result;
use tracing_subscriber::EnvFilter;

/// flvforge - FLV inspection and repair toolkit
#[derive(Parser, Clone)]
#[command(name = "flvforge")]
#[command(about = "Inspect, repair, split and join FLV files", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Debug logging and non-monotonic DTS warnings
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with pipeline options; flags take precedence
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Print the regenerated metadata of a file
    Info(InfoCmd),

    /// Print frames within a DTS window
    Dump(DumpCmd),

    /// Transform one file, optionally regenerating its metadata
    Rewrite(RewriteCmd),

    /// Route tag types to separate files
    Split(SplitCmd),

    /// Join files on one continuous timeline
    Concat(ConcatCmd),
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins over the verbose flag.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::builder().from_env_lossy()
    } else if verbose {
        EnvFilter::new("flvforge=debug")
    } else {
        EnvFilter::new("flvforge=info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Info(cmd) => cmd.run(config, cli.verbose),
        Commands::Dump(cmd) => cmd.run(config, cli.verbose),
        Commands::Rewrite(cmd) => cmd.run(config, cli.verbose),
        Commands::Split(cmd) => cmd.run(config, cli.verbose),
        Commands::Concat(cmd) => cmd.run(config, cli.verbose),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
