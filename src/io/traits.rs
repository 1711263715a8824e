// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Destination trait for admitted frames.
//!
//! The pipeline routes every admitted frame to one [`FrameSink`]: a single
//! file, per-type files, or a printer.

use std::io::Write;

use crate::io::formats::flv::{FlvWriter, Frame};
use crate::Result;

/// Destination for frames leaving the pipeline.
///
/// # Example
///
/// ```
/// use flvforge::io::formats::flv::{FlvHeader, FlvWriter, Frame, Tag, TagType};
/// use flvforge::io::traits::FrameSink;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut sink = FlvWriter::new(Vec::new(), &FlvHeader::default())?;
/// let frame = Frame::from(Tag::new(TagType::Audio, 0, 0, vec![0xAF, 0x01]));
/// FrameSink::write_frame(&mut sink, &frame)?;
/// assert_eq!(FrameSink::frames_written(&sink), 1);
/// # Ok(())
/// # }
/// ```
pub trait FrameSink {
    /// Consume one frame.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush everything written so far.
    fn finish(&mut self) -> Result<()>;

    /// Number of frames accepted.
    fn frames_written(&self) -> u64;
}

impl<W: Write> FrameSink for FlvWriter<W> {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        FlvWriter::write_frame(self, frame)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }

    fn frames_written(&self) -> u64 {
        self.tags_written()
    }
}
