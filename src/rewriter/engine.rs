// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Frame pipeline engine.
//!
//! The [`PipelineEngine`] owns all per-run state (filter chain, split
//! writers, DTS continuation) and feeds one or more inputs through it:
//!
//! 1. Read a tag, recovering from corruption when enabled
//! 2. Evaluate the filter chain (metadata skip, substream, crop)
//! 3. Divert secondary substreams to split files
//! 4. Close idle split files
//! 5. Reconcile the DTS and hand the frame to the sink

use std::io::{Read, Seek};

use tracing::debug;

use super::facade::RewriteStats;
use super::options::PipelineOptions;
use super::split::{SplitClose, StreamSplitter};
use crate::core::Result;
use crate::io::formats::flv::{FlvReader, Frame};
use crate::io::traits::FrameSink;
use crate::transform::{DropReason, FilterChain, TimestampReconciler};

/// Runs frames from one or more inputs through the pipeline.
pub struct PipelineEngine {
    options: PipelineOptions,
    chain: FilterChain,
    splitter: Option<StreamSplitter>,
    /// DTS base for the next input
    next_base: i64,
    /// Bytes of inputs already consumed
    consumed: u64,
    stats: RewriteStats,
}

impl PipelineEngine {
    /// Validate `options` and build the filter chain.
    pub fn new(options: PipelineOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            chain: options.filter_chain(),
            next_base: options.dts_offset,
            options,
            splitter: None,
            consumed: 0,
            stats: RewriteStats::default(),
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn stats(&self) -> &RewriteStats {
        &self.stats
    }

    /// Output DTS of the primary substream after the last input.
    pub fn continuation_offset(&self) -> i64 {
        self.next_base
    }

    /// Feed every remaining tag of `reader` through the pipeline.
    ///
    /// Each input gets a fresh timestamp state whose base is the output
    /// offset reached by the previous input. `progress` receives the number
    /// of input bytes consumed across all inputs so far.
    pub fn run_input<R, S>(
        &mut self,
        reader: &mut FlvReader<R>,
        sink: &mut S,
        progress: &mut dyn FnMut(u64),
    ) -> Result<()>
    where
        R: Read + Seek,
        S: FrameSink + ?Sized,
    {
        if self.options.split_streams.enabled && self.splitter.is_none() {
            self.splitter = Some(StreamSplitter::new(
                self.options.split_streams.clone(),
                *reader.header(),
            ));
        }

        let budget = self.options.recovery.budget();
        let recoveries = reader.recoveries();
        let skipped = reader.bytes_skipped();
        let mut clock = TimestampReconciler::new(self.options.timestamps, self.next_base);

        let result = self.pump(reader, sink, &mut clock, budget, progress);

        self.stats.recovered += reader.recoveries() - recoveries;
        self.stats.bytes_skipped += reader.bytes_skipped() - skipped;
        self.stats.non_monotonic += clock.non_monotonic_count();
        self.stats.corrected_dts += clock.corrected_count();
        self.stats.inputs += 1;
        self.next_base = clock.output_offset();
        self.consumed += reader.file_size();

        debug!(
            context = "pipeline",
            continuation = self.next_base,
            compensation = clock.compensation(),
            "input finished"
        );
        result
    }

    fn pump<R, S>(
        &mut self,
        reader: &mut FlvReader<R>,
        sink: &mut S,
        clock: &mut TimestampReconciler,
        budget: Option<u64>,
        progress: &mut dyn FnMut(u64),
    ) -> Result<()>
    where
        R: Read + Seek,
        S: FrameSink + ?Sized,
    {
        while let Some(tag) = reader.read_tag_recovering(budget)? {
            let mut frame = Frame::from(tag);
            self.stats.frames_read += 1;

            let verdict = self.chain.evaluate(&frame);
            if let Some(reason) = verdict.primary() {
                let compensate = clock.compensates(verdict.contains(DropReason::Crop));
                clock.note_dropped(&frame, compensate);
                self.stats.record_drop(reason);
                continue;
            }

            if let Some(splitter) = self.splitter.as_mut() {
                if StreamSplitter::is_eligible(&frame) {
                    splitter.write_frame(&frame, clock.output_offset())?;
                    let compensate = clock.compensates(false);
                    clock.note_dropped(&frame, compensate);
                    self.stats.record_drop(DropReason::SplitStream);
                    continue;
                }
                splitter.maintain(clock.output_offset())?;
            }

            clock.reconcile(&mut frame);
            sink.write_frame(&frame)?;
            self.stats.frames_written += 1;
            progress(self.consumed + reader.position());
        }
        Ok(())
    }

    /// Flush the sink, close every split file, and return the statistics.
    pub fn finish<S: FrameSink + ?Sized>(mut self, sink: &mut S) -> Result<RewriteStats> {
        sink.finish()?;
        if let Some(mut splitter) = self.splitter.take() {
            splitter.close_all()?;
            for closed in splitter.closed() {
                match closed {
                    SplitClose::Kept(_) => self.stats.split_files_kept += 1,
                    SplitClose::Deleted(_) => self.stats.split_files_deleted += 1,
                }
            }
        }
        Ok(self.stats)
    }
}
