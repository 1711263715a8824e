// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use flvforge::encoding::amf::AmfEncoder;
use flvforge::{FlvHeader, FlvReader, FlvWriter, Properties, ScriptValue, Tag, TagType};

// ============================================================================
// Temporary directories
// ============================================================================

/// Removes the directory when dropped.
#[derive(Debug)]
pub struct CleanupGuard(pub PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Fresh per-test directory under the system temp dir.
pub fn temp_dir(name: &str) -> (PathBuf, CleanupGuard) {
    let dir = std::env::temp_dir().join(format!("flvforge_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    (dir.clone(), CleanupGuard(dir))
}

// ============================================================================
// Tag builders
// ============================================================================

/// AVC video tag; keyframes carry flavor 1, others flavor 2.
pub fn video(dts: u32, stream: u32, keyframe: bool) -> Tag {
    let first = if keyframe { 0x17 } else { 0x27 };
    Tag::new(TagType::Video, dts, stream, vec![first, 0x01, 0, 0, 0, 0xAA])
}

/// AAC, 44 kHz, 16 bit, stereo.
pub fn audio(dts: u32, stream: u32) -> Tag {
    Tag::new(TagType::Audio, dts, stream, vec![0xAF, 0x01, 0x21, 0x10])
}

/// `onMetaData` script tag carrying `props`.
pub fn on_metadata(props: Properties) -> Tag {
    let mut encoder = AmfEncoder::new();
    encoder.encode(&ScriptValue::string("onMetaData")).unwrap();
    encoder
        .encode(&ScriptValue::AssociativeArray(props))
        .unwrap();
    Tag::new(TagType::Meta, 0, 0, encoder.finish())
}

/// Interleaved audio/video at 40 ms spacing with a keyframe every second.
pub fn av_sequence(duration_ms: u32) -> Vec<Tag> {
    let mut tags = Vec::new();
    for dts in (0..=duration_ms).step_by(40) {
        tags.push(video(dts, 0, dts % 1000 == 0));
        tags.push(audio(dts, 0));
    }
    tags
}

// ============================================================================
// Files
// ============================================================================

/// Write `tags` behind a default header; returns each tag's offset.
pub fn write_flv(path: &Path, tags: &[Tag]) -> Vec<u64> {
    let mut writer = FlvWriter::create(path, &FlvHeader::default()).unwrap();
    let offsets = tags.iter().map(|t| writer.write_tag(t).unwrap()).collect();
    writer.finish().unwrap();
    offsets
}

/// Read every tag of a file, failing on corruption.
pub fn read_tags(path: &Path) -> Vec<Tag> {
    let mut reader = FlvReader::open(path).unwrap();
    let mut tags = Vec::new();
    while let Some(tag) = reader.read_tag().unwrap() {
        tags.push(tag);
    }
    tags
}

/// DTS values of the tags of `tag_type` on `stream`.
pub fn dts_of(tags: &[Tag], tag_type: TagType, stream: u32) -> Vec<u32> {
    tags.iter()
        .filter(|t| t.tag_type == tag_type && t.stream_id == stream)
        .map(|t| t.dts)
        .collect()
}

/// Decoded onMetaData object of a script tag.
pub fn metadata_of(tag: &Tag) -> Properties {
    let values = flvforge::encoding::amf::decode_all(&tag.body).unwrap();
    match values.into_iter().nth(1) {
        Some(ScriptValue::AssociativeArray(props)) | Some(ScriptValue::Object(props)) => props,
        other => panic!("not an onMetaData payload: {other:?}"),
    }
}

/// `keyframes.filepositions` of a metadata object.
pub fn filepositions(meta: &Properties) -> Vec<u64> {
    meta.get("keyframes")
        .and_then(ScriptValue::as_properties)
        .and_then(|k| k.get("filepositions"))
        .and_then(ScriptValue::as_list)
        .unwrap()
        .iter()
        .filter_map(ScriptValue::as_f64)
        .map(|v| v as u64)
        .collect()
}
