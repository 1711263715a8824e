// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Typed view over raw tags.
//!
//! A [`Frame`] wraps a [`Tag`] and exposes the few payload header fields the
//! pipeline needs: video flavor, codec id and legacy dimensions, audio
//! format, rate, sample size and channel layout, or the decoded script
//! event. Payload bytes are otherwise opaque.

use std::fmt;

use super::constants::ON_METADATA;
use super::tag::{Tag, TagType};
use crate::core::{Result, ScriptValue};
use crate::encoding::amf::decode_all;

/// Sorenson H.263 codec id.
pub const CODEC_SORENSON_H263: u8 = 2;
/// Screen Video codec id.
pub const CODEC_SCREEN_VIDEO: u8 = 3;
/// Screen Video 2 codec id.
pub const CODEC_SCREEN_VIDEO_2: u8 = 6;

/// Sample rates indexed by the 2-bit rate field.
const AUDIO_RATES: [u32; 4] = [5512, 11025, 22050, 44100];

/// Fixed H.263 picture sizes for size codes 2..=6.
const H263_SIZES: [(u16, u16); 5] = [(352, 288), (176, 144), (128, 96), (320, 240), (160, 120)];

/// Video frame flavor from the upper nibble of the first body byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFlavor {
    Keyframe,
    InterFrame,
    DisposableInter,
    GeneratedKeyframe,
    VideoInfo,
    Unknown(u8),
}

impl VideoFlavor {
    pub fn from_nibble(value: u8) -> Self {
        match value {
            1 => VideoFlavor::Keyframe,
            2 => VideoFlavor::InterFrame,
            3 => VideoFlavor::DisposableInter,
            4 => VideoFlavor::GeneratedKeyframe,
            5 => VideoFlavor::VideoInfo,
            other => VideoFlavor::Unknown(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VideoFlavor::Keyframe => "keyframe",
            VideoFlavor::InterFrame => "interframe",
            VideoFlavor::DisposableInter => "disposable",
            VideoFlavor::GeneratedKeyframe => "generated-keyframe",
            VideoFlavor::VideoInfo => "info",
            VideoFlavor::Unknown(_) => "unknown",
        }
    }
}

/// Audio channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub tag: Tag,
    pub flavor: VideoFlavor,
    pub codec_id: u8,
    /// Picture width, 0 when the payload does not carry it
    pub width: u16,
    /// Picture height, 0 when the payload does not carry it
    pub height: u16,
}

impl VideoFrame {
    fn parse(tag: Tag) -> Self {
        let first = tag.body.first().copied().unwrap_or(0);
        let codec_id = first & 0x0F;
        let (width, height) = legacy_dimensions(codec_id, &tag.body).unwrap_or((0, 0));
        Self {
            flavor: VideoFlavor::from_nibble(first >> 4),
            codec_id,
            width,
            height,
            tag,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        self.flavor == VideoFlavor::Keyframe
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub tag: Tag,
    /// Sound format (codec id)
    pub format: u8,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample, 8 or 16
    pub bit_size: u8,
    pub channels: ChannelLayout,
}

impl AudioFrame {
    fn parse(tag: Tag) -> Self {
        let first = tag.body.first().copied().unwrap_or(0);
        Self {
            format: first >> 4,
            sample_rate: AUDIO_RATES[usize::from((first >> 2) & 0x03)],
            bit_size: if first & 0x02 != 0 { 16 } else { 8 },
            channels: if first & 0x01 != 0 {
                ChannelLayout::Stereo
            } else {
                ChannelLayout::Mono
            },
            tag,
        }
    }
}

/// Decoded script tag: event name followed by its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEvent {
    /// Event name, when the first value is a string
    pub name: Option<String>,
    /// Values following the name
    pub args: Vec<ScriptValue>,
}

impl ScriptEvent {
    /// First argument, the payload of `onMetaData`.
    pub fn payload(&self) -> Option<&ScriptValue> {
        self.args.first()
    }

    pub fn is_on_metadata(&self) -> bool {
        self.name.as_deref() == Some(ON_METADATA)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaFrame {
    pub tag: Tag,
}

impl MetaFrame {
    /// Decode the script body.
    ///
    /// Decoding is lazy: frames that are only copied never pay for it.
    pub fn decode(&self) -> Result<ScriptEvent> {
        let mut values = decode_all(&self.tag.body)?;
        let name = match values.first() {
            Some(ScriptValue::String(_)) => match values.remove(0) {
                ScriptValue::String(s) => Some(s),
                _ => None,
            },
            _ => None,
        };
        Ok(ScriptEvent { name, args: values })
    }
}

/// A tag dispatched by type.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Video(VideoFrame),
    Audio(AudioFrame),
    Meta(MetaFrame),
}

impl From<Tag> for Frame {
    fn from(tag: Tag) -> Self {
        match tag.tag_type {
            TagType::Video => Frame::Video(VideoFrame::parse(tag)),
            TagType::Audio => Frame::Audio(AudioFrame::parse(tag)),
            TagType::Meta => Frame::Meta(MetaFrame { tag }),
        }
    }
}

impl Frame {
    pub fn tag(&self) -> &Tag {
        match self {
            Frame::Video(f) => &f.tag,
            Frame::Audio(f) => &f.tag,
            Frame::Meta(f) => &f.tag,
        }
    }

    pub fn tag_mut(&mut self) -> &mut Tag {
        match self {
            Frame::Video(f) => &mut f.tag,
            Frame::Audio(f) => &mut f.tag,
            Frame::Meta(f) => &mut f.tag,
        }
    }

    pub fn into_tag(self) -> Tag {
        match self {
            Frame::Video(f) => f.tag,
            Frame::Audio(f) => f.tag,
            Frame::Meta(f) => f.tag,
        }
    }

    pub fn tag_type(&self) -> TagType {
        self.tag().tag_type
    }

    pub fn dts(&self) -> u32 {
        self.tag().dts
    }

    pub fn set_dts(&mut self, dts: u32) {
        self.tag_mut().dts = dts;
    }

    pub fn stream_id(&self) -> u32 {
        self.tag().stream_id
    }

    pub fn position(&self) -> u64 {
        self.tag().position
    }

    /// True only for video frames of the keyframe flavor.
    pub fn is_video_keyframe(&self) -> bool {
        matches!(self, Frame::Video(v) if v.is_keyframe())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        write!(
            f,
            "{} stream={} dts={} pos={} size={}",
            tag.tag_type,
            tag.stream_id,
            tag.dts,
            tag.position,
            tag.body.len()
        )?;
        match self {
            Frame::Video(v) => {
                write!(f, " flavor={} codec={}", v.flavor.name(), v.codec_id)?;
                if v.width > 0 && v.height > 0 {
                    write!(f, " {}x{}", v.width, v.height)?;
                }
                Ok(())
            }
            Frame::Audio(a) => write!(
                f,
                " format={} rate={} bits={} {}",
                a.format,
                a.sample_rate,
                a.bit_size,
                match a.channels {
                    ChannelLayout::Mono => "mono",
                    ChannelLayout::Stereo => "stereo",
                }
            ),
            Frame::Meta(_) => Ok(()),
        }
    }
}

/// MSB-first bit reader over a byte slice.
struct BitReader<'a> {
    data: &'a [u8],
    bit: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, bit: 0 }
    }

    fn read(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let byte = *self.data.get(self.bit / 8)?;
            let bit = (byte >> (7 - self.bit % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.bit += 1;
        }
        Some(value)
    }
}

/// Picture dimensions carried in legacy codec payload headers.
fn legacy_dimensions(codec_id: u8, body: &[u8]) -> Option<(u16, u16)> {
    let payload = body.get(1..)?;
    let mut bits = BitReader::new(payload);
    match codec_id {
        CODEC_SORENSON_H263 => {
            let _start_code = bits.read(17)?;
            let _version = bits.read(5)?;
            let _temporal_ref = bits.read(8)?;
            match bits.read(3)? {
                0 => Some((bits.read(8)? as u16, bits.read(8)? as u16)),
                1 => Some((bits.read(16)? as u16, bits.read(16)? as u16)),
                code @ 2..=6 => Some(H263_SIZES[code as usize - 2]),
                _ => None,
            }
        }
        CODEC_SCREEN_VIDEO | CODEC_SCREEN_VIDEO_2 => {
            let _block_width = bits.read(4)?;
            let width = bits.read(12)? as u16;
            let _block_height = bits.read(4)?;
            let height = bits.read(12)? as u16;
            Some((width, height))
        }
        _ => None,
    }
}
