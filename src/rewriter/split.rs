// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-substream split files.
//!
//! Frames of non-primary substreams are written to their own files, named
//! `n-<seq>-ts-<base dts>-s-<substream>.flv`. A file is closed once its
//! substream has been silent for `stop_after` milliseconds of primary
//! timeline, and deleted on close if it spans less than `minimal_duration`.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::options::SplitStreamOptions;
use crate::core::Result;
use crate::io::formats::flv::{FlvHeader, FlvWriter, Frame, TagType};

/// Open split file.
struct SplitWriterState {
    path: PathBuf,
    writer: FlvWriter<BufWriter<File>>,
    /// Base DTS when the file was opened
    first_dts: i64,
    /// Base DTS of the latest frame
    last_dts: i64,
    /// Input DTS of the first frame, subtracted from every frame
    offset_dts: u32,
}

impl SplitWriterState {
    fn span(&self) -> i64 {
        self.last_dts - self.first_dts
    }
}

/// Outcome of closing a split file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitClose {
    Kept(PathBuf),
    Deleted(PathBuf),
}

/// Demultiplexes secondary substreams into files.
pub struct StreamSplitter {
    options: SplitStreamOptions,
    header: FlvHeader,
    writers: BTreeMap<u32, SplitWriterState>,
    sequence: u32,
    closed: Vec<SplitClose>,
}

impl StreamSplitter {
    /// Create a splitter writing files with `header`.
    pub fn new(options: SplitStreamOptions, header: FlvHeader) -> Self {
        Self {
            options,
            header,
            writers: BTreeMap::new(),
            sequence: 0,
            closed: Vec::new(),
        }
    }

    /// Whether a frame belongs in a split file rather than the main output.
    pub fn is_eligible(frame: &Frame) -> bool {
        frame.stream_id() != 0 && frame.tag_type() != TagType::Meta
    }

    /// Number of files currently open.
    pub fn open_count(&self) -> usize {
        self.writers.len()
    }

    /// Files closed so far, in closing order.
    pub fn closed(&self) -> &[SplitClose] {
        &self.closed
    }

    /// Write a frame to the file of its substream, opening one if needed.
    ///
    /// `base_dts` is the current output DTS of the primary substream.
    pub fn write_frame(&mut self, frame: &Frame, base_dts: i64) -> Result<()> {
        let stream = frame.stream_id();
        let state = match self.writers.entry(stream) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.sequence += 1;
                let opened = open_split_file(
                    &self.options.output_dir,
                    &self.header,
                    self.sequence,
                    stream,
                    base_dts,
                    frame.dts(),
                )?;
                entry.insert(opened)
            }
        };
        let mut tag = frame.tag().clone();
        tag.dts = tag.dts.saturating_sub(state.offset_dts);
        state.writer.write_tag(&tag)?;
        state.last_dts = base_dts;
        Ok(())
    }

    /// Close every file whose substream has been silent past `stop_after`.
    pub fn maintain(&mut self, base_dts: i64) -> Result<()> {
        let stop_after = i64::from(self.options.stop_after);
        let expired: Vec<u32> = self
            .writers
            .iter()
            .filter(|(_, state)| base_dts - state.last_dts > stop_after)
            .map(|(stream, _)| *stream)
            .collect();
        for stream in expired {
            if let Some(state) = self.writers.remove(&stream) {
                self.close(stream, state)?;
            }
        }
        Ok(())
    }

    /// Close every open file.
    pub fn close_all(&mut self) -> Result<()> {
        let writers = std::mem::take(&mut self.writers);
        for (stream, state) in writers {
            self.close(stream, state)?;
        }
        Ok(())
    }

    fn close(&mut self, stream: u32, state: SplitWriterState) -> Result<()> {
        let span = state.span();
        let path = state.path;
        drop(state.writer.finish()?);

        if span < i64::from(self.options.minimal_duration) {
            std::fs::remove_file(&path)?;
            info!(
                context = "split",
                stream,
                span,
                path = %path.display(),
                "removed short split file"
            );
            self.closed.push(SplitClose::Deleted(path));
        } else {
            info!(
                context = "split",
                stream,
                span,
                path = %path.display(),
                "closed split file"
            );
            self.closed.push(SplitClose::Kept(path));
        }
        Ok(())
    }
}

/// Create the file for `stream`, named after its sequence number and base DTS.
fn open_split_file(
    dir: &Path,
    header: &FlvHeader,
    sequence: u32,
    stream: u32,
    base_dts: i64,
    dts: u32,
) -> Result<SplitWriterState> {
    let name = format!("n-{sequence:05}-ts-{base_dts}-s-{stream}.flv");
    let path = dir.join(name);
    info!(
        context = "split",
        stream,
        base_dts,
        path = %path.display(),
        "opening split file"
    );
    let writer = FlvWriter::create(&path, header)?;
    Ok(SplitWriterState {
        path,
        writer,
        first_dts: base_dts,
        last_dts: base_dts,
        offset_dts: dts,
    })
}

impl Drop for StreamSplitter {
    fn drop(&mut self) {
        if let Err(e) = self.close_all() {
            warn!(context = "split", error = %e, "failed to close split files");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::formats::flv::{FlvReader, Tag};

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "flvforge_split_{}_{}",
                name,
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&dir);
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn splitter(dir: &TempDir, minimal_duration: u32) -> StreamSplitter {
        let options = SplitStreamOptions {
            enabled: true,
            minimal_duration,
            stop_after: 5000,
            output_dir: dir.0.clone(),
        };
        StreamSplitter::new(options, FlvHeader::default())
    }

    fn video(dts: u32, stream: u32) -> Frame {
        Frame::from(Tag::new(TagType::Video, dts, stream, vec![0x27, 0]))
    }

    #[test]
    fn test_eligibility() {
        assert!(!StreamSplitter::is_eligible(&video(0, 0)));
        assert!(StreamSplitter::is_eligible(&video(0, 2)));
        let meta = Frame::from(Tag::new(TagType::Meta, 0, 2, vec![0x05]));
        assert!(!StreamSplitter::is_eligible(&meta));
    }

    #[test]
    fn test_file_name_and_rebased_dts() {
        let dir = TempDir::new("name");
        let mut split = splitter(&dir, 0);
        split.write_frame(&video(3000, 7), 1200).unwrap();
        split.write_frame(&video(3040, 7), 1240).unwrap();
        split.close_all().unwrap();

        let path = dir.0.join("n-00001-ts-1200-s-7.flv");
        assert_eq!(split.closed(), &[SplitClose::Kept(path.clone())]);
        let mut reader = FlvReader::open(&path).unwrap();
        let dts: Vec<u32> = std::iter::from_fn(|| reader.read_tag().unwrap())
            .map(|t| t.dts)
            .collect();
        assert_eq!(dts, vec![0, 40]);
    }

    #[test]
    fn test_short_file_deleted_after_silence() {
        let dir = TempDir::new("short");
        let mut split = splitter(&dir, 5000);
        for base in (1000..=3000).step_by(500) {
            split.write_frame(&video(base, 1), i64::from(base)).unwrap();
        }
        split.maintain(8000).unwrap();
        assert_eq!(split.open_count(), 1);
        split.maintain(8001).unwrap();
        assert_eq!(split.open_count(), 0);

        let path = dir.0.join("n-00001-ts-1000-s-1.flv");
        assert_eq!(split.closed(), &[SplitClose::Deleted(path.clone())]);
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_closes_open_files() {
        let dir = TempDir::new("drop");
        {
            let mut split = splitter(&dir, 5000);
            split.write_frame(&video(0, 3), 0).unwrap();
        }
        assert!(!dir.0.join("n-00001-ts-0-s-3.flv").exists());
    }

    #[test]
    fn test_long_file_kept_and_sequence_advances() {
        let dir = TempDir::new("long");
        let mut split = splitter(&dir, 5000);
        split.write_frame(&video(0, 1), 0).unwrap();
        split.write_frame(&video(6000, 1), 6000).unwrap();
        split.write_frame(&video(6000, 2), 6000).unwrap();
        split.close_all().unwrap();

        assert_eq!(
            split.closed(),
            &[
                SplitClose::Kept(dir.0.join("n-00001-ts-0-s-1.flv")),
                SplitClose::Deleted(dir.0.join("n-00002-ts-6000-s-2.flv")),
            ]
        );
    }

    #[test]
    fn test_interleaved_streams_reuse_their_files() {
        let dir = TempDir::new("reuse");
        let mut split = splitter(&dir, 0);
        for (dts, stream) in [(100, 1), (100, 2), (140, 1), (140, 2)] {
            split.write_frame(&video(dts, stream), i64::from(dts)).unwrap();
        }
        assert_eq!(split.open_count(), 2);
        split.close_all().unwrap();

        for name in ["n-00001-ts-100-s-1.flv", "n-00002-ts-100-s-2.flv"] {
            let mut reader = FlvReader::open(dir.0.join(name)).unwrap();
            let dts: Vec<u32> = std::iter::from_fn(|| reader.read_tag().unwrap())
                .map(|t| t.dts)
                .collect();
            assert_eq!(dts, vec![0, 40]);
        }
    }
}
