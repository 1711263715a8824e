// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Concat command - join inputs on one timeline.

use std::path::{Path, PathBuf};

use clap::Args;

use super::print_stats;
use crate::common::{total_size, PipelineArgs, ProgressBar, Result};
use flvforge::FlvRewriter;

/// Append inputs one after another.
#[derive(Args, Clone, Debug)]
pub struct ConcatCmd {
    /// Output FLV file
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Input FLV files, in order
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

impl ConcatCmd {
    pub fn run(self, config: Option<&Path>, verbose: bool) -> Result<()> {
        let options = self.pipeline.to_options(config, verbose)?;

        println!("Concatenating {} inputs:", self.inputs.len());
        for input in &self.inputs {
            println!("  {}", input.display());
        }
        println!("  Output: {}", self.output.display());

        let progress = ProgressBar::new(total_size(&self.inputs), "concat");
        let pb = progress.clone();
        let mut rewriter = FlvRewriter::new(options)?.with_progress(move |done| pb.set_position(done));
        let stats = rewriter.concat(&self.inputs, &self.output)?;
        progress.finish_with_message("done".to_string());

        print_stats(&stats);
        Ok(())
    }
}
