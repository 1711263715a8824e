// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};

use clap::Args;

use flvforge::rewriter::{
    parse_crop_ranges, parse_skip_rules, parse_stream_selection, PipelineOptions,
};

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Pipeline flags shared by every mode.
///
/// Flags override the values loaded from `--config`.
#[derive(Args, Clone, Debug, Default)]
pub struct PipelineArgs {
    /// Skip corrupt tags instead of aborting
    #[arg(long)]
    pub recover: bool,

    /// Bytes to scan for the next valid tag, 0 scans to the end
    #[arg(long, value_name = "BYTES")]
    pub recover_scan_length: Option<u64>,

    /// Keep only these substreams (format: video:1,audio:0)
    #[arg(long, value_name = "TYPE:ID,...")]
    pub streams: Option<String>,

    /// Remove DTS ranges (format: 1000..2000,5000..6000)
    #[arg(long, value_name = "START..STOP,...")]
    pub crop: Option<String>,

    /// Start and end crop ranges on video keyframes only
    #[arg(long)]
    pub crop_wait_keyframe: bool,

    /// Drop onMetaData tags whose key holds one of the values (format: key=v1|v2)
    #[arg(long, value_name = "KEY=V1|V2")]
    pub skip_meta: Vec<String>,

    /// Replace non-monotonic DTS values by extrapolation
    #[arg(long)]
    pub fix_dts: bool,

    /// Multiply every DTS by this factor
    #[arg(long, value_name = "FACTOR")]
    pub scale_dts: Option<f64>,

    /// Close the timeline gap left by every dropped frame
    #[arg(long)]
    pub compensate_dts: bool,

    /// Add this many milliseconds to every output DTS
    #[arg(long, value_name = "MS", allow_hyphen_values = true)]
    pub dts_offset: Option<i64>,

    /// Write secondary substreams to their own files
    #[arg(long)]
    pub split_streams: bool,

    /// Delete split files shorter than this many milliseconds
    #[arg(long, value_name = "MS")]
    pub split_min_duration: Option<u32>,

    /// Close split files after this many milliseconds of silence
    #[arg(long, value_name = "MS")]
    pub split_stop_after: Option<u32>,

    /// Directory for split files
    #[arg(long, value_name = "DIR")]
    pub split_dir: Option<PathBuf>,
}

impl PipelineArgs {
    /// Merge the flags over the optional config file.
    pub fn to_options(&self, config: Option<&Path>, verbose: bool) -> Result<PipelineOptions> {
        let mut options = match config {
            Some(path) => PipelineOptions::from_toml_file(path)?,
            None => PipelineOptions::default(),
        };

        if self.recover {
            options.recovery.enabled = true;
        }
        if let Some(budget) = self.recover_scan_length {
            options.recovery.scan_budget = budget;
        }
        if let Some(streams) = &self.streams {
            options.streams.extend(parse_stream_selection(streams)?);
        }
        if let Some(crop) = &self.crop {
            options.crop = parse_crop_ranges(crop)?;
        }
        if self.crop_wait_keyframe {
            options.crop_wait_keyframe = true;
        }
        for rule in &self.skip_meta {
            for (key, values) in parse_skip_rules(rule)? {
                options = options.with_skip_meta(key, values);
            }
        }
        if self.fix_dts {
            options.timestamps.fix = true;
        }
        if let Some(scale) = self.scale_dts {
            options.timestamps.scale = scale;
        }
        if self.compensate_dts {
            options.timestamps.compensate = true;
        }
        if verbose {
            options.timestamps.warn_non_monotonic = true;
        }
        if let Some(offset) = self.dts_offset {
            options.dts_offset = offset;
        }
        if self.split_streams {
            options.split_streams.enabled = true;
        }
        if let Some(ms) = self.split_min_duration {
            options.split_streams.minimal_duration = ms;
        }
        if let Some(ms) = self.split_stop_after {
            options.split_streams.stop_after = ms;
        }
        if let Some(dir) = &self.split_dir {
            options.split_streams.output_dir = dir.clone();
        }

        options.validate()?;
        Ok(options)
    }
}

/// Sum of the sizes of `paths`, for progress totals.
pub fn total_size<P: AsRef<Path>>(paths: &[P]) -> u64 {
    paths
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .sum()
}

/// Progress bar wrapper for consistent progress reporting.
#[derive(Clone)]
pub struct ProgressBar {
    inner: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a new progress bar, hidden when stderr is not a terminal.
    pub fn new(total: u64, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new(total);
            let style = indicatif::ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .progress_chars("=>-");
            pb.set_style(style);
            pb.set_prefix(prefix);
            Some(pb)
        } else {
            None
        };

        Self { inner }
    }

    /// Set the number of bytes processed.
    pub fn set_position(&self, pos: u64) {
        if let Some(pb) = &self.inner {
            pb.set_position(pos);
        }
    }

    /// Finish the progress bar with a message.
    pub fn finish_with_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.finish_with_message(msg);
        }
    }
}
