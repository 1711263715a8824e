// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dump command - print admitted frames.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::common::{PipelineArgs, Result};
use flvforge::rewriter::DumpSink;
use flvforge::FlvRewriter;

/// Print one line per frame.
#[derive(Args, Clone, Debug)]
pub struct DumpCmd {
    /// Input FLV file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print only frames with a DTS above this value
    #[arg(long, value_name = "MS")]
    min_dts: Option<u32>,

    /// Print only frames with a DTS below this value
    #[arg(long, value_name = "MS")]
    max_dts: Option<u32>,

    /// Append the first body bytes in hex
    #[arg(long)]
    hex: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

impl DumpCmd {
    pub fn run(self, config: Option<&Path>, verbose: bool) -> Result<()> {
        let options = self.pipeline.to_options(config, verbose)?;
        let sink = DumpSink::new(std::io::stdout().lock())
            .with_window(self.min_dts, self.max_dts)
            .with_hex(self.hex);
        let stats = FlvRewriter::new(options)?.dump(&self.input, sink)?;
        tracing::debug!(
            frames_read = stats.frames_read,
            frames_admitted = stats.frames_written,
            "dump finished"
        );
        Ok(())
    }
}
