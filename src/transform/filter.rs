// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Substream selection and metadata-based skipping.

use std::collections::BTreeMap;

use super::{DropReason, FrameFilter};
use crate::io::formats::flv::{Frame, TagType};

/// Keeps only one substream id per tag type.
///
/// Types without a selection pass every substream.
#[derive(Debug, Clone, Default)]
pub struct SubstreamFilter {
    selected: BTreeMap<TagType, u32>,
}

impl SubstreamFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `stream_id` for `tag_type`.
    pub fn with_stream(mut self, tag_type: TagType, stream_id: u32) -> Self {
        self.selected.insert(tag_type, stream_id);
        self
    }

    pub fn selected(&self, tag_type: TagType) -> Option<u32> {
        self.selected.get(&tag_type).copied()
    }
}

impl FromIterator<(TagType, u32)> for SubstreamFilter {
    fn from_iter<I: IntoIterator<Item = (TagType, u32)>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}

impl FrameFilter for SubstreamFilter {
    fn reason(&self) -> DropReason {
        DropReason::Substream
    }

    fn should_drop(&mut self, frame: &Frame) -> bool {
        self.selected(frame.tag_type())
            .is_some_and(|id| id != frame.stream_id())
    }

    fn is_noop(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Drops script frames whose onMetaData payload carries a forbidden value.
///
/// A rule maps a metadata key to the string values that trigger the skip.
/// Frames that fail to decode are never skipped.
#[derive(Debug, Clone, Default)]
pub struct MetaSkipFilter {
    rules: BTreeMap<String, Vec<String>>,
}

impl MetaSkipFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip frames where `key` equals any of `values`.
    pub fn with_rule(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.rules.entry(key.into()).or_default().extend(values);
        self
    }

    /// Whether `frame` matches a rule.
    pub fn matches(&self, frame: &Frame) -> bool {
        let Frame::Meta(meta) = frame else {
            return false;
        };
        let event = match meta.decode() {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(
                    context = "meta_skip",
                    dts = frame.dts(),
                    error = %e,
                    "script frame does not decode, keeping it"
                );
                return false;
            }
        };
        if !event.is_on_metadata() {
            return false;
        }
        let Some(props) = event.payload().and_then(|p| p.as_properties()) else {
            return false;
        };
        self.rules.iter().any(|(key, forbidden)| {
            props
                .get(key)
                .and_then(|v| v.as_str())
                .is_some_and(|s| forbidden.iter().any(|f| f == s))
        })
    }
}

impl FrameFilter for MetaSkipFilter {
    fn reason(&self) -> DropReason {
        DropReason::MetaSkip
    }

    fn should_drop(&mut self, frame: &Frame) -> bool {
        self.matches(frame)
    }

    fn is_noop(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Properties, ScriptValue};
    use crate::encoding::amf::AmfEncoder;
    use crate::io::formats::flv::Tag;

    fn meta_frame(entries: Properties) -> Frame {
        let mut encoder = AmfEncoder::new();
        encoder.encode(&ScriptValue::string("onMetaData")).unwrap();
        encoder
            .encode(&ScriptValue::AssociativeArray(entries))
            .unwrap();
        Frame::from(Tag::new(TagType::Meta, 0, 0, encoder.finish()))
    }

    #[test]
    fn test_substream_filter() {
        let mut filter = SubstreamFilter::new().with_stream(TagType::Video, 1);
        let video0 = Frame::from(Tag::new(TagType::Video, 0, 0, vec![0x17]));
        let video1 = Frame::from(Tag::new(TagType::Video, 0, 1, vec![0x17]));
        let audio2 = Frame::from(Tag::new(TagType::Audio, 0, 2, vec![0xAF]));
        assert!(filter.should_drop(&video0));
        assert!(!filter.should_drop(&video1));
        assert!(!filter.should_drop(&audio2));
        assert!(SubstreamFilter::new().is_noop());
    }

    #[test]
    fn test_meta_skip_matches_forbidden_value() {
        let mut filter = MetaSkipFilter::new().with_rule(
            "encoder",
            vec!["Lavf".to_string(), "obs".to_string()],
        );
        let skipped = meta_frame(Properties::new().with("encoder", ScriptValue::string("obs")));
        let kept = meta_frame(Properties::new().with("encoder", ScriptValue::string("x264")));
        let numeric = meta_frame(Properties::new().with("encoder", ScriptValue::Number(1.0)));
        assert!(filter.should_drop(&skipped));
        assert!(!filter.should_drop(&kept));
        assert!(!filter.should_drop(&numeric));
    }

    #[test]
    fn test_meta_skip_ignores_undecodable_and_other_types() {
        let mut filter = MetaSkipFilter::new().with_rule("k", vec!["v".to_string()]);
        let broken = Frame::from(Tag::new(TagType::Meta, 0, 0, vec![0x02, 0x00]));
        let audio = Frame::from(Tag::new(TagType::Audio, 0, 0, vec![0xAF]));
        assert!(!filter.should_drop(&broken));
        assert!(!filter.should_drop(&audio));
    }
}
