// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Operating modes.
//!
//! [`FlvRewriter`] exposes the five mutually exclusive modes over one set of
//! [`PipelineOptions`]:
//!
//! - [`info`](FlvRewriter::info) - regenerate metadata without writing
//! - [`dump`](FlvRewriter::dump) - print admitted frames
//! - [`rewrite`](FlvRewriter::rewrite) - transform into one output
//! - [`split`](FlvRewriter::split) - fan out by tag type
//! - [`concat`](FlvRewriter::concat) - join inputs on one timeline

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use super::engine::PipelineEngine;
use super::metadata::{scan_metadata, MetadataReport};
use super::options::PipelineOptions;
use super::sink::{ContentSplitSink, DumpSink};
use crate::core::{CodecError, Result};
use crate::io::formats::flv::{FlvReader, FlvWriter, TagType};
use crate::transform::DropReason;

/// Statistics from a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Inputs processed
    pub inputs: u64,
    /// Tags read, recovered tags included
    pub frames_read: u64,
    /// Frames handed to the output
    pub frames_written: u64,
    /// Frames not written, by first matching reason
    pub dropped: BTreeMap<DropReason, u64>,
    /// Corrupt tags skipped by recovery
    pub recovered: u64,
    /// Bytes skipped while recovering
    pub bytes_skipped: u64,
    /// Non-monotonic DTS values seen
    pub non_monotonic: u64,
    /// DTS values replaced by extrapolation
    pub corrected_dts: u64,
    pub split_files_kept: u64,
    pub split_files_deleted: u64,
    /// Whether a regenerated metadata tag was written first
    pub metadata_written: bool,
}

impl RewriteStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_default() += 1;
    }

    /// Frames dropped for `reason`.
    pub fn dropped(&self, reason: DropReason) -> u64 {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped.values().sum()
    }
}

/// Mode facade over a set of pipeline options.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use flvforge::rewriter::{FlvRewriter, PipelineOptions};
///
/// let options = PipelineOptions::new().with_fix_dts(true).with_recovery(0);
/// let mut rewriter = FlvRewriter::new(options)?;
/// let stats = rewriter.rewrite("broken.flv", "fixed.flv", true)?;
/// println!("{} frames written", stats.frames_written);
/// # Ok(())
/// # }
/// ```
pub struct FlvRewriter {
    options: PipelineOptions,
    progress: Option<Box<dyn FnMut(u64)>>,
}

impl FlvRewriter {
    /// Create a facade, rejecting invalid options.
    pub fn new(options: PipelineOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            progress: None,
        })
    }

    /// Receive the number of input bytes consumed while a mode runs.
    pub fn with_progress(mut self, progress: impl FnMut(u64) + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Scan `input` and regenerate its metadata without writing anything.
    pub fn info<P: AsRef<Path>>(&self, input: P) -> Result<MetadataReport> {
        let mut reader = FlvReader::open(input)?;
        scan_metadata(&mut reader, self.options.recovery.budget())
    }

    /// Print every admitted frame to `sink`.
    pub fn dump<P: AsRef<Path>, W: Write>(
        &mut self,
        input: P,
        mut sink: DumpSink<W>,
    ) -> Result<RewriteStats> {
        let mut engine = PipelineEngine::new(self.options.clone())?;
        let mut reader = FlvReader::open(input)?;
        engine.run_input(&mut reader, &mut sink, &mut |_| {})?;
        engine.finish(&mut sink)
    }

    /// Transform `input` into `output`.
    ///
    /// With `regenerate_metadata` the input is scanned first, the new
    /// metadata tag is written at the start of the output, and copying
    /// resumes right after the original metadata tag it replaces.
    pub fn rewrite<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input: P,
        output: Q,
        regenerate_metadata: bool,
    ) -> Result<RewriteStats> {
        let mut engine = PipelineEngine::new(self.options.clone())?;
        let mut reader = FlvReader::open(input)?;
        let mut writer = FlvWriter::create(output, reader.header())?;

        if regenerate_metadata {
            let report = scan_metadata(&mut reader, self.options.recovery.budget())?;
            info!(
                context = "rewrite",
                old_size = report.old_size,
                new_size = report.new_size,
                delta = report.delta,
                resume = report.resume_position,
                "writing regenerated metadata"
            );
            writer.write_tag(&report.tag())?;
            reader.seek_to(report.resume_position)?;
        }

        let progress = &mut self.progress;
        engine.run_input(&mut reader, &mut writer, &mut |done| {
            if let Some(callback) = progress.as_mut() {
                callback(done)
            }
        })?;
        let mut stats = engine.finish(&mut writer)?;
        stats.metadata_written = regenerate_metadata;
        Ok(stats)
    }

    /// Route each tag type of `input` to its destination file.
    pub fn split<P: AsRef<Path>>(
        &mut self,
        input: P,
        destinations: &BTreeMap<TagType, PathBuf>,
    ) -> Result<RewriteStats> {
        let mut engine = PipelineEngine::new(self.options.clone())?;
        let mut reader = FlvReader::open(input)?;
        let mut sink = ContentSplitSink::create(destinations, reader.header())?;

        let progress = &mut self.progress;
        engine.run_input(&mut reader, &mut sink, &mut |done| {
            if let Some(callback) = progress.as_mut() {
                callback(done)
            }
        })?;
        engine.finish(&mut sink)
    }

    /// Join `inputs` in order into `output`, continuing the DTS timeline.
    ///
    /// The output header is copied from the first input.
    pub fn concat<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        inputs: &[P],
        output: Q,
    ) -> Result<RewriteStats> {
        let Some((first, rest)) = inputs.split_first() else {
            return Err(CodecError::config("concat needs at least one input"));
        };

        let mut engine = PipelineEngine::new(self.options.clone())?;
        let mut reader = FlvReader::open(first)?;
        let mut writer = FlvWriter::create(output, reader.header())?;

        let progress = &mut self.progress;
        let mut report = |done: u64| {
            if let Some(callback) = progress.as_mut() {
                callback(done)
            }
        };
        engine.run_input(&mut reader, &mut writer, &mut report)?;
        for path in rest {
            info!(
                context = "concat",
                input = %path.as_ref().display(),
                offset = engine.continuation_offset(),
                "appending input"
            );
            let mut reader = FlvReader::open(path)?;
            engine.run_input(&mut reader, &mut writer, &mut report)?;
        }
        engine.finish(&mut writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_stats_default() {
        let stats = RewriteStats::default();
        assert_eq!(stats.frames_read, 0);
        assert_eq!(stats.total_dropped(), 0);
    }

    #[test]
    fn test_record_drop() {
        let mut stats = RewriteStats::new();
        stats.record_drop(DropReason::Crop);
        stats.record_drop(DropReason::Crop);
        stats.record_drop(DropReason::MetaSkip);
        assert_eq!(stats.dropped(DropReason::Crop), 2);
        assert_eq!(stats.dropped(DropReason::Substream), 0);
        assert_eq!(stats.total_dropped(), 3);
    }

    #[test]
    fn test_concat_requires_input() {
        let mut rewriter = FlvRewriter::new(PipelineOptions::default()).unwrap();
        let inputs: [&str; 0] = [];
        let err = rewriter.concat(&inputs, "unused.flv").unwrap_err();
        assert!(matches!(err, CodecError::ConfigError { .. }));
    }

    #[test]
    fn test_new_validates() {
        let options = PipelineOptions::new().with_scale(0.0);
        assert!(FlvRewriter::new(options).is_err());
    }
}
