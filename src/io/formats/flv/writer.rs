// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! FLV tag writer.
//!
//! The writer is non-transactional: every tag is handed to the underlying
//! sink as soon as it is written, and whatever was flushed before a failure
//! stays on disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, WriteBytesExt};

use super::constants::{HEADER_SIZE, MAX_U24, TAG_HEADER_SIZE};
use super::frame::Frame;
use super::header::FlvHeader;
use super::tag::Tag;
use crate::core::{CodecError, Result};

/// Serializes a header followed by tags.
pub struct FlvWriter<W: Write> {
    inner: W,
    path: Option<PathBuf>,
    bytes_written: u64,
    tags_written: u64,
}

impl FlvWriter<BufWriter<File>> {
    /// Create (or truncate) a file and write `header` to it.
    pub fn create<P: AsRef<Path>>(path: P, header: &FlvHeader) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            CodecError::from(std::io::Error::new(
                e.kind(),
                format!("cannot create {}: {e}", path.display()),
            ))
        })?;
        let mut writer = Self::new(BufWriter::new(file), header)?;
        writer.path = Some(path.to_path_buf());
        Ok(writer)
    }
}

impl<W: Write> FlvWriter<W> {
    /// Wrap a sink and write `header`, any extension padding, and the
    /// leading zero trailer.
    pub fn new(mut inner: W, header: &FlvHeader) -> Result<Self> {
        inner.write_all(&header.to_bytes())?;
        let padding = header.data_offset as usize - HEADER_SIZE;
        if padding > 0 {
            inner.write_all(&vec![0u8; padding])?;
        }
        inner.write_u32::<BigEndian>(0)?;
        Ok(Self {
            inner,
            path: None,
            bytes_written: header.data_start(),
            tags_written: 0,
        })
    }

    /// Destination path, when created from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write one tag with a freshly computed trailer.
    ///
    /// Returns the byte offset at which the tag was written.
    pub fn write_tag(&mut self, tag: &Tag) -> Result<u64> {
        let body_size = u32::try_from(tag.body.len())
            .ok()
            .filter(|n| *n <= MAX_U24)
            .ok_or_else(|| {
                CodecError::encode(
                    "FLV",
                    format!("tag body of {} bytes exceeds 24 bits", tag.body.len()),
                )
            })?;
        if tag.stream_id > MAX_U24 {
            return Err(CodecError::encode(
                "FLV",
                format!("stream id {} exceeds 24 bits", tag.stream_id),
            ));
        }

        let offset = self.bytes_written;
        self.inner.write_u8(tag.tag_type.as_byte())?;
        self.inner.write_u24::<BigEndian>(body_size)?;
        self.inner.write_u24::<BigEndian>(tag.dts & MAX_U24)?;
        self.inner.write_u8((tag.dts >> 24) as u8)?;
        self.inner.write_u24::<BigEndian>(tag.stream_id)?;
        self.inner.write_all(&tag.body)?;
        self.inner
            .write_u32::<BigEndian>(TAG_HEADER_SIZE as u32 + body_size)?;

        self.bytes_written += tag.framed_size();
        self.tags_written += 1;
        Ok(offset)
    }

    /// Write the tag wrapped by a frame.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<u64> {
        self.write_tag(frame.tag())
    }

    /// Bytes written so far, header included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of tags written.
    pub fn tags_written(&self) -> u64 {
        self.tags_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
