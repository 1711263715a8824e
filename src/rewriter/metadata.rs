// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Metadata regeneration.
//!
//! [`MetadataBuilder`] observes every frame of an input once and then
//! assembles a canonical `onMetaData` object. The keyframe index, `filesize`
//! and `datasize` are shifted by the size difference between the new
//! metadata tag and the one it replaces, so the index is valid for the file
//! that results from writing the new tag in place of the old one.

use std::io::{Read, Seek};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::{CodecError, Properties, Result, ScriptValue};
use crate::encoding::amf::AmfEncoder;
use crate::io::formats::flv::{
    framed_size, ChannelLayout, FlvReader, Frame, Tag, TagType, ON_METADATA,
};

/// Value of the `metadatacreator` key.
pub const METADATA_CREATOR: &str = "flvforge";

#[derive(Debug, Clone, Copy, Default)]
struct TypeTotals {
    frames: u64,
    framed_bytes: u64,
    payload_bytes: u64,
}

impl TypeTotals {
    fn add(&mut self, tag: &Tag) {
        self.frames += 1;
        self.framed_bytes += tag.framed_size();
        self.payload_bytes += tag.body.len() as u64;
    }
}

/// One entry of the keyframe index, as found in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyframeEntry {
    pub dts: u32,
    /// Byte offset of the tag in the input
    pub position: u64,
}

#[derive(Debug, Clone, Copy)]
struct OriginalMetadata {
    position: u64,
    size: u64,
}

/// Result of a metadata regeneration pass.
#[derive(Debug, Clone)]
pub struct MetadataReport {
    /// The regenerated onMetaData object, offsets already corrected
    pub metadata: Properties,
    /// Encoded tag body: the event name followed by the object
    pub body: Vec<u8>,
    /// Framed size of the replaced metadata tag, 0 when there was none
    pub old_size: u64,
    /// Framed size of the new metadata tag
    pub new_size: u64,
    /// `new_size - old_size`
    pub delta: i64,
    /// Input offset from which the remaining tags are copied: the end of the
    /// replaced metadata tag, or the data start when there was none
    pub resume_position: u64,
    /// Keyframes at their input positions
    pub keyframes: Vec<KeyframeEntry>,
}

impl MetadataReport {
    /// The new metadata tag, at DTS 0 on the primary substream.
    pub fn tag(&self) -> Tag {
        Tag::new(TagType::Meta, 0, 0, self.body.clone())
    }

    pub fn has_original(&self) -> bool {
        self.old_size > 0
    }
}

/// Single-pass statistics collector.
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    video: TypeTotals,
    audio: TypeTotals,
    meta: TypeTotals,
    keyframes: Vec<KeyframeEntry>,
    width: u16,
    height: u16,
    video_codec: u8,
    audio_codec: u8,
    sample_rate: u32,
    sample_size: u8,
    stereo: bool,
    last_dts: u32,
    last_video_dts: u32,
    last_keyframe_dts: u32,
    original: Option<OriginalMetadata>,
    created_at: Option<DateTime<Utc>>,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the `metadatadate` value instead of using the time of [`finish`](Self::finish).
    pub fn with_creation_time(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Number of keyframes seen so far.
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Account for one frame.
    ///
    /// Fails when a script tag body cannot be decoded.
    pub fn observe(&mut self, frame: &Frame) -> Result<()> {
        let tag = frame.tag();
        match frame {
            Frame::Video(video) => {
                if (self.width == 0 || self.height == 0) && video.width > 0 && video.height > 0 {
                    self.width = video.width;
                    self.height = video.height;
                }
                if video.is_keyframe() {
                    self.keyframes.push(KeyframeEntry {
                        dts: tag.dts,
                        position: tag.position,
                    });
                    self.last_keyframe_dts = tag.dts;
                }
                self.last_video_dts = tag.dts;
                self.video_codec = video.codec_id;
                self.video.add(tag);
            }
            Frame::Audio(audio) => {
                self.sample_rate = audio.sample_rate;
                self.sample_size = audio.bit_size;
                self.stereo |= audio.channels == ChannelLayout::Stereo;
                self.audio_codec = audio.format;
                self.audio.add(tag);
            }
            Frame::Meta(meta) => {
                let event = meta.decode()?;
                if event.is_on_metadata() {
                    if self.original.is_none() {
                        self.original = Some(OriginalMetadata {
                            position: tag.position,
                            size: tag.framed_size(),
                        });
                        if let Some(props) = event.payload().and_then(ScriptValue::as_properties) {
                            self.adopt_original(props);
                        }
                    }
                } else {
                    warn!(
                        context = "metadata",
                        event = event.name.as_deref().unwrap_or("<unnamed>"),
                        dts = tag.dts,
                        "unknown script event"
                    );
                }
                self.meta.add(tag);
            }
        }
        self.last_dts = tag.dts;
        Ok(())
    }

    fn adopt_original(&mut self, props: &Properties) {
        for (key, value) in props.iter() {
            debug!(context = "metadata", key, value = %value, "original onMetaData");
        }
        let dimension = |key: &str| {
            props
                .get(key)
                .and_then(ScriptValue::as_f64)
                .filter(|v| *v > 0.0 && *v <= f64::from(u16::MAX))
                .map(|v| v as u16)
        };
        if self.width == 0 {
            self.width = dimension("width").unwrap_or(0);
        }
        if self.height == 0 {
            self.height = dimension("height").unwrap_or(0);
        }
    }

    /// Assemble and encode the new metadata.
    ///
    /// `file_size` is the size of the input and `data_start` the offset of
    /// its first tag. Only an onMetaData tag at `data_start` is replaced; one
    /// found later stays in the stream and the new tag is inserted before it.
    pub fn finish(mut self, file_size: u64, data_start: u64) -> Result<MetadataReport> {
        if let Some(original) = self.original.filter(|o| o.position != data_start) {
            debug!(
                context = "metadata",
                position = original.position,
                "onMetaData is not the first tag, keeping it"
            );
            self.original = None;
        }
        let old_size = self.original.map_or(0, |o| o.size);

        // Every Number encodes to nine bytes, so the size does not depend on
        // the correction and one encoding pass is enough to measure it.
        let draft = self.assemble(file_size, 0);
        let new_size = framed_size(encode_body(&draft)?.len());
        let delta = i64::try_from(new_size).unwrap_or(i64::MAX) - old_size as i64;

        let metadata = self.assemble(file_size, delta);
        let body = encode_body(&metadata)?;
        if framed_size(body.len()) != new_size {
            return Err(CodecError::encode(
                "AMF0",
                "metadata size changed after offset correction",
            ));
        }

        for (key, value) in metadata.iter() {
            debug!(context = "metadata", key, value = %value, "new onMetaData");
        }

        // Only the old metadata tag is replaced, so every later tag moves by
        // exactly `delta`.
        let resume_position = self
            .original
            .map_or(data_start, |o| o.position + o.size);

        Ok(MetadataReport {
            metadata,
            body,
            old_size,
            new_size,
            delta,
            resume_position,
            keyframes: self.keyframes,
        })
    }

    fn assemble(&self, file_size: u64, delta: i64) -> Properties {
        let seconds = |ms: u32| ScriptValue::Number(f64::from(ms) / 1000.0);
        let shifted = |value: u64| ScriptValue::Number((value as i64 + delta) as f64);
        let duration = f64::from(self.last_dts) / 1000.0;
        let rate = |bytes: u64| {
            if duration > 0.0 {
                bytes as f64 / duration * 8.0 / 1000.0
            } else {
                0.0
            }
        };
        let framerate = if duration > 0.0 {
            (self.video.frames as f64 / duration).floor()
        } else {
            0.0
        };
        let created = self.created_at.unwrap_or_else(Utc::now);
        let data_size = self.video.framed_bytes + self.audio.framed_bytes + self.meta.framed_bytes;

        let keyframes = Properties::new()
            .with(
                "times",
                ScriptValue::OrderedList(self.keyframes.iter().map(|k| seconds(k.dts)).collect()),
            )
            .with(
                "filepositions",
                ScriptValue::OrderedList(self.keyframes.iter().map(|k| shifted(k.position)).collect()),
            );

        Properties::new()
            .with("metadatacreator", ScriptValue::string(METADATA_CREATOR))
            .with(
                "metadatadate",
                ScriptValue::Date {
                    millis: created.timestamp_millis() as f64,
                    timezone: 0,
                },
            )
            .with("keyframes", ScriptValue::Object(keyframes))
            .with("hasVideo", ScriptValue::Boolean(self.video.frames > 0))
            .with("hasAudio", ScriptValue::Boolean(self.audio.frames > 0))
            .with("hasMetadata", ScriptValue::Boolean(true))
            .with("hasKeyframes", ScriptValue::Boolean(!self.keyframes.is_empty()))
            .with("hasCuePoints", ScriptValue::Boolean(false))
            .with("videocodecid", ScriptValue::Number(f64::from(self.video_codec)))
            .with("width", ScriptValue::Number(f64::from(self.width)))
            .with("height", ScriptValue::Number(f64::from(self.height)))
            .with("videosize", ScriptValue::Number(self.video.framed_bytes as f64))
            .with("framerate", ScriptValue::Number(framerate))
            .with("videodatarate", ScriptValue::Number(rate(self.video.payload_bytes)))
            .with("audiocodecid", ScriptValue::Number(f64::from(self.audio_codec)))
            .with("stereo", ScriptValue::Boolean(self.stereo))
            .with("audiosamplesize", ScriptValue::Number(f64::from(self.sample_size)))
            .with("audiodelay", ScriptValue::Number(0.0))
            .with("audiodatarate", ScriptValue::Number(rate(self.audio.payload_bytes)))
            .with("audiosize", ScriptValue::Number(self.audio.framed_bytes as f64))
            .with("audiosamplerate", ScriptValue::Number(f64::from(self.sample_rate)))
            .with("filesize", shifted(file_size))
            .with("datasize", shifted(data_size))
            .with("lasttimestamp", seconds(self.last_video_dts))
            .with("lastkeyframetimestamp", seconds(self.last_keyframe_dts))
            .with("cuePoints", ScriptValue::OrderedList(Vec::new()))
            .with("duration", ScriptValue::Number(duration))
            .with("canSeekToEnd", ScriptValue::Boolean(false))
    }
}

fn encode_body(metadata: &Properties) -> Result<Vec<u8>> {
    let mut encoder = AmfEncoder::new();
    encoder.encode(&ScriptValue::string(ON_METADATA))?;
    encoder.encode(&ScriptValue::AssociativeArray(metadata.clone()))?;
    Ok(encoder.finish())
}

/// Read every remaining tag of `reader` and build the metadata report.
///
/// With `scan_budget` set, corrupt tags are skipped the same way the
/// rewrite pass skips them.
pub fn scan_metadata<R: Read + Seek>(
    reader: &mut FlvReader<R>,
    scan_budget: Option<u64>,
) -> Result<MetadataReport> {
    scan_with(reader, scan_budget, MetadataBuilder::new())
}

/// [`scan_metadata`] with a preconfigured builder.
pub fn scan_with<R: Read + Seek>(
    reader: &mut FlvReader<R>,
    scan_budget: Option<u64>,
    mut builder: MetadataBuilder,
) -> Result<MetadataReport> {
    while let Some(tag) = reader.read_tag_recovering(scan_budget)? {
        builder.observe(&Frame::from(tag))?;
    }
    builder.finish(reader.file_size(), reader.data_start())
}
