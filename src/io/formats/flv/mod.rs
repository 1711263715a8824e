// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! FLV container codec.
//!
//! - [`FlvReader`]: header parsing, sequential tag reads, recovery scan
//! - [`FlvWriter`]: header and tag serialization with computed trailers
//! - [`Frame`]: typed view over a [`Tag`]

pub mod constants;
pub mod frame;
pub mod header;
pub mod reader;
pub mod tag;
pub mod writer;

pub use constants::{ON_METADATA, TAG_HEADER_SIZE, TAG_TRAILER_SIZE};
pub use frame::{
    AudioFrame, ChannelLayout, Frame, MetaFrame, ScriptEvent, VideoFlavor, VideoFrame,
};
pub use header::FlvHeader;
pub use reader::{FlvReader, Recovered};
pub use tag::{framed_size, Tag, TagType};
pub use writer::FlvWriter;
