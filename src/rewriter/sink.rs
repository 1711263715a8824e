// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Frame destinations beyond a single output file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::info;

use crate::core::{CodecError, Result};
use crate::io::formats::flv::{FlvHeader, FlvWriter, Frame, TagType};
use crate::io::traits::FrameSink;

/// Number of body bytes printed by [`DumpSink`] in hex mode.
pub const DUMP_HEX_BYTES: usize = 16;

/// Routes each tag type to its own file.
///
/// Types mapped to the same path share one writer, so their frames stay
/// interleaved in input order. Types without a destination are discarded.
pub struct ContentSplitSink {
    writers: Vec<FlvWriter<BufWriter<File>>>,
    routes: BTreeMap<TagType, usize>,
    written: u64,
    discarded: u64,
}

impl ContentSplitSink {
    /// Create one writer per distinct destination path.
    pub fn create(destinations: &BTreeMap<TagType, PathBuf>, header: &FlvHeader) -> Result<Self> {
        if destinations.is_empty() {
            return Err(CodecError::config(
                "content split needs at least one destination",
            ));
        }

        let mut writers = Vec::new();
        let mut routes = BTreeMap::new();
        let mut by_path: BTreeMap<&PathBuf, (usize, TagType)> = BTreeMap::new();
        for (tag_type, path) in destinations {
            match by_path.get(path) {
                Some(&(index, owner)) => {
                    info!(
                        context = "split",
                        tag_type = %tag_type,
                        shared_with = %owner,
                        path = %path.display(),
                        "sharing output writer"
                    );
                    routes.insert(*tag_type, index);
                }
                None => {
                    writers.push(FlvWriter::create(path, header)?);
                    let index = writers.len() - 1;
                    by_path.insert(path, (index, *tag_type));
                    routes.insert(*tag_type, index);
                }
            }
        }

        Ok(Self {
            writers,
            routes,
            written: 0,
            discarded: 0,
        })
    }

    /// Number of distinct output files.
    pub fn writer_count(&self) -> usize {
        self.writers.len()
    }

    /// Frames dropped because their type has no destination.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl FrameSink for ContentSplitSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let writer = self
            .routes
            .get(&frame.tag_type())
            .and_then(|index| self.writers.get_mut(*index));
        match writer {
            Some(writer) => {
                writer.write_frame(frame)?;
                self.written += 1;
            }
            None => self.discarded += 1,
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writers.iter_mut().try_for_each(FlvWriter::flush)
    }

    fn frames_written(&self) -> u64 {
        self.written
    }
}

/// Prints one line per frame whose DTS lies strictly inside a window.
pub struct DumpSink<W: Write> {
    out: W,
    min_dts: Option<u32>,
    max_dts: Option<u32>,
    hex: bool,
    printed: u64,
}

impl<W: Write> DumpSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            min_dts: None,
            max_dts: None,
            hex: false,
            printed: 0,
        }
    }

    /// Exclusive DTS bounds; `None` leaves a side open.
    pub fn with_window(mut self, min_dts: Option<u32>, max_dts: Option<u32>) -> Self {
        self.min_dts = min_dts;
        self.max_dts = max_dts;
        self
    }

    /// Append the first body bytes in hex.
    pub fn with_hex(mut self, hex: bool) -> Self {
        self.hex = hex;
        self
    }

    pub fn in_window(&self, dts: u32) -> bool {
        self.min_dts.map_or(true, |min| dts > min) && self.max_dts.map_or(true, |max| dts < max)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for DumpSink<W> {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if !self.in_window(frame.dts()) {
            return Ok(());
        }
        if self.hex {
            let body = &frame.tag().body;
            let head = &body[..body.len().min(DUMP_HEX_BYTES)];
            writeln!(self.out, "{frame} body={}", hex::encode(head))?;
        } else {
            writeln!(self.out, "{frame}")?;
        }
        self.printed += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.printed
    }
}
