// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod concat;
mod dump;
mod info;
mod rewrite;
mod split;

pub use concat::ConcatCmd;
pub use dump::DumpCmd;
pub use info::InfoCmd;
pub use rewrite::RewriteCmd;
pub use split::SplitCmd;

use flvforge::RewriteStats;

/// Print the statistics of a pipeline run.
pub(crate) fn print_stats(stats: &RewriteStats) {
    println!("  Frames read:    {}", stats.frames_read);
    println!("  Frames written: {}", stats.frames_written);
    for (reason, count) in &stats.dropped {
        println!("  Dropped ({reason}): {count}");
    }
    if stats.recovered > 0 {
        println!(
            "  Recovered:      {} corrupt tags, {} bytes skipped",
            stats.recovered, stats.bytes_skipped
        );
    }
    if stats.non_monotonic > 0 {
        println!(
            "  Non-monotonic:  {} ({} corrected)",
            stats.non_monotonic, stats.corrected_dts
        );
    }
    if stats.split_files_kept + stats.split_files_deleted > 0 {
        println!(
            "  Split files:    {} kept, {} deleted",
            stats.split_files_kept, stats.split_files_deleted
        );
    }
}
