// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sequential FLV tag reader with bounded corruption recovery.
//!
//! # Tag Layout
//!
//! ```text
//! type (1) | body size (3) | dts low (3) | dts ext (1) | stream id (3) | body | trailer (4)
//! ```
//!
//! The trailer must equal the 11-byte header plus the body length. A tag
//! that fails any check is reported as [`CodecError::CorruptTag`] at its
//! header position; [`FlvReader::recover`] then scans forward for the next
//! plausible tag.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use tracing::warn;

use super::constants::{HEADER_SIZE, TAG_HEADER_SIZE, TAG_TRAILER_SIZE};
use super::frame::Frame;
use super::header::FlvHeader;
use super::tag::{Tag, TagType};
use crate::core::{CodecError, Result};

/// Tag found by a recovery scan.
#[derive(Debug, Clone)]
pub struct Recovered {
    pub tag: Tag,
    /// Bytes between the corrupt tag position and the recovered tag
    pub skipped: u64,
}

/// Forward-only tag reader over a seekable source.
pub struct FlvReader<R: Read + Seek> {
    inner: BufReader<R>,
    header: FlvHeader,
    position: u64,
    file_size: u64,
    recoveries: u64,
    bytes_skipped: u64,
}

impl FlvReader<File> {
    /// Open a file and parse its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(file)
    }
}

impl<R: Read + Seek> FlvReader<R> {
    /// Wrap a source and parse its header.
    ///
    /// Fails with [`CodecError::MalformedHeader`] when the signature does not
    /// match or the source is shorter than the header.
    pub fn new(mut source: R) -> Result<Self> {
        let file_size = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        let mut inner = BufReader::new(source);

        let mut raw = [0u8; HEADER_SIZE];
        if let Err(e) = inner.read_exact(&mut raw) {
            return Err(match e.kind() {
                ErrorKind::UnexpectedEof => CodecError::malformed_header(format!(
                    "input of {file_size} bytes is shorter than the file header"
                )),
                _ => e.into(),
            });
        }
        let header = FlvHeader::parse(&raw)?;

        let data_start = header.data_start();
        if data_start > file_size {
            return Err(CodecError::malformed_header(format!(
                "data start {data_start} is past the end of input ({file_size} bytes)"
            )));
        }
        // Skip any extension bytes and the leading zero trailer.
        inner.seek(SeekFrom::Start(data_start))?;

        Ok(Self {
            inner,
            header,
            position: data_start,
            file_size,
            recoveries: 0,
            bytes_skipped: 0,
        })
    }

    /// The parsed file header.
    pub fn header(&self) -> &FlvHeader {
        &self.header
    }

    /// Byte offset of the next tag.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total size of the source in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Byte offset of the first tag.
    pub fn data_start(&self) -> u64 {
        self.header.data_start()
    }

    /// Reposition to a tag boundary.
    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }

    /// Read the next tag.
    ///
    /// Returns `Ok(None)` at a clean end of input. On error the reader stays
    /// positioned at the failed tag.
    pub fn read_tag(&mut self) -> Result<Option<Tag>> {
        let start = self.position;
        match self.read_tag_at(start) {
            Ok(tag) => {
                if let Some(tag) = &tag {
                    self.position = tag.end_position();
                }
                Ok(tag)
            }
            Err(e) => {
                self.inner.seek(SeekFrom::Start(start))?;
                Err(e)
            }
        }
    }

    /// Read the next tag as a typed frame.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.read_tag()?.map(Frame::from))
    }

    /// Read the next tag, scanning past corruption when `scan_budget` is set.
    ///
    /// With `None` every error is returned. With `Some(budget)` a
    /// [`CodecError::CorruptTag`] triggers [`FlvReader::recover`] and the
    /// recovered tag is returned in place of the corrupt one.
    pub fn read_tag_recovering(&mut self, scan_budget: Option<u64>) -> Result<Option<Tag>> {
        match (self.read_tag(), scan_budget) {
            (Err(e), Some(budget)) if e.is_recoverable() => {
                let recovered = self.recover(&e, budget)?;
                self.recoveries += 1;
                self.bytes_skipped += recovered.skipped;
                warn!(
                    context = "recover",
                    position = recovered.tag.position,
                    skipped = recovered.skipped,
                    error = %e,
                    "got fine tag after skipping corrupt bytes"
                );
                Ok(Some(recovered.tag))
            }
            (result, _) => result,
        }
    }

    /// Number of successful recoveries through [`FlvReader::read_tag_recovering`].
    pub fn recoveries(&self) -> u64 {
        self.recoveries
    }

    /// Bytes skipped by those recoveries.
    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped
    }

    fn read_tag_at(&mut self, start: u64) -> Result<Option<Tag>> {
        let mut head = [0u8; TAG_HEADER_SIZE];
        let filled = read_full(&mut self.inner, &mut head)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < TAG_HEADER_SIZE {
            return Err(CodecError::corrupt_tag(
                start,
                format!("truncated tag header ({filled} of {TAG_HEADER_SIZE} bytes)"),
            ));
        }

        let tag_type = TagType::from_byte(head[0]).ok_or_else(|| {
            CodecError::corrupt_tag(start, format!("invalid tag type 0x{:02x}", head[0]))
        })?;
        let body_size = BigEndian::read_u24(&head[1..4]);
        let dts = BigEndian::read_u24(&head[4..7]) | (u32::from(head[7]) << 24);
        let stream_id = BigEndian::read_u24(&head[8..11]);

        let end = start + (TAG_HEADER_SIZE + TAG_TRAILER_SIZE) as u64 + u64::from(body_size);
        if end > self.file_size {
            return Err(CodecError::corrupt_tag(
                start,
                format!(
                    "declared body size {body_size} runs past the end of input ({} bytes)",
                    self.file_size
                ),
            ));
        }

        let mut body = vec![0u8; body_size as usize];
        self.inner
            .read_exact(&mut body)
            .map_err(|e| eof_as_corrupt(e, start, "tag body"))?;
        let trailer = self
            .inner
            .read_u32::<BigEndian>()
            .map_err(|e| eof_as_corrupt(e, start, "tag trailer"))?;

        let expected = TAG_HEADER_SIZE as u32 + body_size;
        if trailer != expected {
            return Err(CodecError::corrupt_tag(
                start,
                format!("trailer {trailer} does not match tag size {expected}"),
            ));
        }

        Ok(Some(Tag {
            tag_type,
            dts,
            stream_id,
            body,
            position: start,
            trailer,
        }))
    }

    /// Scan forward from a corrupt tag for the next valid one.
    ///
    /// The scan starts one byte after the corrupt tag's position and probes
    /// every offset holding a valid type byte. A probe succeeds when the
    /// declared body fits in the input, the trailer matches, and the full
    /// tag parses. `budget` caps the number of bytes examined; 0 scans to
    /// the end of input.
    ///
    /// Errors other than [`CodecError::CorruptTag`] are returned unchanged.
    /// On success the reader is positioned after the recovered tag.
    pub fn recover(&mut self, err: &CodecError, budget: u64) -> Result<Recovered> {
        let origin = match err {
            CodecError::CorruptTag { position, .. } => *position,
            other => return Err(other.clone()),
        };

        let first = origin + 1;
        let limit = if budget == 0 {
            self.file_size
        } else {
            first.saturating_add(budget).min(self.file_size)
        };

        self.inner.seek(SeekFrom::Start(first))?;
        let mut offset = first;
        let mut byte = [0u8; 1];
        while offset < limit {
            if self.inner.read(&mut byte)? == 0 {
                break;
            }
            if TagType::from_byte(byte[0]).is_some() {
                if let Some(tag) = self.probe(offset)? {
                    self.position = tag.end_position();
                    return Ok(Recovered {
                        skipped: offset - origin,
                        tag,
                    });
                }
                self.inner.seek(SeekFrom::Start(offset + 1))?;
            }
            offset += 1;
        }

        self.seek_to(origin)?;
        Err(CodecError::recovery_exhausted(origin, offset - first))
    }

    /// Try to parse a tag at `offset`, leaving the source unspecified on `None`.
    fn probe(&mut self, offset: u64) -> Result<Option<Tag>> {
        let min_end = offset + (TAG_HEADER_SIZE + TAG_TRAILER_SIZE) as u64;
        if min_end > self.file_size {
            return Ok(None);
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut head = [0u8; TAG_HEADER_SIZE];
        self.inner.read_exact(&mut head)?;
        let body_size = BigEndian::read_u24(&head[1..4]);
        if min_end + u64::from(body_size) > self.file_size {
            return Ok(None);
        }

        self.inner
            .seek(SeekFrom::Current(i64::from(body_size)))?;
        let trailer = self.inner.read_u32::<BigEndian>()?;
        if trailer != TAG_HEADER_SIZE as u32 + body_size {
            return Ok(None);
        }

        self.inner.seek(SeekFrom::Start(offset))?;
        match self.read_tag_at(offset) {
            Ok(tag) => Ok(tag),
            Err(e) if e.is_recoverable() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Fill `buf` as far as the source allows, returning the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn eof_as_corrupt(err: std::io::Error, position: u64, what: &str) -> CodecError {
    match err.kind() {
        ErrorKind::UnexpectedEof => CodecError::corrupt_tag(position, format!("truncated {what}")),
        _ => err.into(),
    }
}
