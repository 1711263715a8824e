// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Split command - route tag types to separate files.

use std::path::{Path, PathBuf};

use clap::Args;

use super::print_stats;
use crate::common::{total_size, PipelineArgs, ProgressBar, Result};
use flvforge::rewriter::parse_type_paths;
use flvforge::FlvRewriter;

/// Write video, audio and script tags to their own files.
#[derive(Args, Clone, Debug)]
pub struct SplitCmd {
    /// Input FLV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Destinations per tag type (format: video:v.flv,audio:a.flv,meta:v.flv)
    #[arg(long, value_name = "TYPE:PATH,...")]
    outc: String,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

impl SplitCmd {
    pub fn run(self, config: Option<&Path>, verbose: bool) -> Result<()> {
        let options = self.pipeline.to_options(config, verbose)?;
        let destinations = parse_type_paths(&self.outc)?;

        println!("Splitting {}:", self.input.display());
        for (tag_type, path) in &destinations {
            println!("  {tag_type} -> {}", path.display());
        }

        let progress = ProgressBar::new(total_size(&[&self.input]), "split");
        let pb = progress.clone();
        let mut rewriter = FlvRewriter::new(options)?.with_progress(move |done| pb.set_position(done));
        let stats = rewriter.split(&self.input, &destinations)?;
        progress.finish_with_message("done".to_string());

        print_stats(&stats);
        Ok(())
    }
}
