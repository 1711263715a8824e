// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Rewrite command - transform one input into one output.

use std::path::{Path, PathBuf};

use clap::Args;

use super::print_stats;
use crate::common::{total_size, PipelineArgs, ProgressBar, Result};
use flvforge::FlvRewriter;

/// Repair and transform a file.
#[derive(Args, Clone, Debug)]
pub struct RewriteCmd {
    /// Input FLV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output FLV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Regenerate onMetaData with a keyframe index
    #[arg(long)]
    update_keyframes: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

impl RewriteCmd {
    pub fn run(self, config: Option<&Path>, verbose: bool) -> Result<()> {
        let options = self.pipeline.to_options(config, verbose)?;

        println!("Rewriting:");
        println!("  Input:  {}", self.input.display());
        println!("  Output: {}", self.output.display());

        let progress = ProgressBar::new(total_size(&[&self.input]), "rewrite");
        let pb = progress.clone();
        let mut rewriter = FlvRewriter::new(options)?.with_progress(move |done| pb.set_position(done));
        let stats = rewriter.rewrite(&self.input, &self.output, self.update_keyframes)?;
        progress.finish_with_message("done".to_string());

        if stats.metadata_written {
            println!("  Metadata regenerated");
        }
        print_stats(&stats);
        Ok(())
    }
}
