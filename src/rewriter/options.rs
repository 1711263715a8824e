// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Pipeline configuration.
//!
//! [`PipelineOptions`] can be built in code with the `with_*` methods or
//! deserialized from TOML:
//!
//! ```toml
//! crop = [{ start = 1000, stop = 2000 }]
//! crop_wait_keyframe = true
//!
//! [recovery]
//! enabled = true
//! scan_budget = 65536
//!
//! [timestamps]
//! fix = true
//! scale = 1.0
//!
//! [streams]
//! video = 0
//!
//! [skip_meta]
//! encoder = ["Lavf58.29.100"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{CodecError, Result};
use crate::io::formats::flv::TagType;
use crate::transform::{
    CropEngine, CropRange, FilterChain, MetaSkipFilter, SubstreamFilter, TimestampOptions,
};

/// Errors raised while parsing option strings.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OptionsError {
    /// Crop range is not `start..stop` with `start <= stop`.
    #[error("invalid crop range '{input}': {reason}")]
    InvalidCropRange {
        /// Offending text
        input: String,
        /// What is wrong with it
        reason: String,
    },

    /// Type name is not one of video, audio, meta.
    #[error("unknown tag type '{0}' (expected video, audio or meta)")]
    UnknownTagType(String),

    /// Entry is not `name:value` or `key=value`.
    #[error("malformed entry '{input}', expected {expected}")]
    MalformedEntry {
        /// Offending text
        input: String,
        /// Expected shape
        expected: &'static str,
    },

    /// Numeric field does not parse.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// Scale factor is not a positive finite number.
    #[error("scale must be a positive finite number, got {0}")]
    InvalidScale(f64),

    /// Configuration file could not be read or parsed.
    #[error("cannot load config {path}: {reason}")]
    ConfigFile {
        /// File path
        path: String,
        /// Read or parse failure
        reason: String,
    },
}

impl From<OptionsError> for CodecError {
    fn from(err: OptionsError) -> Self {
        CodecError::config(err.to_string())
    }
}

/// Corruption recovery settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryOptions {
    /// Scan past corrupt tags instead of aborting
    pub enabled: bool,
    /// Bytes examined per scan; 0 scans to the end of input
    pub scan_budget: u64,
}

impl RecoveryOptions {
    /// Budget to hand to the reader, `None` when recovery is disabled.
    pub fn budget(&self) -> Option<u64> {
        self.enabled.then_some(self.scan_budget)
    }
}

/// Per-substream split file settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitStreamOptions {
    /// Divert non-primary substreams to their own files
    pub enabled: bool,
    /// Files spanning less than this many milliseconds are deleted on close
    pub minimal_duration: u32,
    /// Close a file after this many milliseconds without frames
    pub stop_after: u32,
    /// Directory receiving the split files
    pub output_dir: PathBuf,
}

impl Default for SplitStreamOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            minimal_duration: 5000,
            stop_after: 5000,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Every per-run setting of the frame pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub recovery: RecoveryOptions,
    pub timestamps: TimestampOptions,
    /// Added to every output DTS of the first input
    pub dts_offset: i64,
    /// Selected substream id per tag type; absent types keep every substream
    pub streams: BTreeMap<TagType, u32>,
    pub crop: Vec<CropRange>,
    pub crop_wait_keyframe: bool,
    /// onMetaData key to forbidden string values
    pub skip_meta: BTreeMap<String, Vec<String>>,
    pub split_streams: SplitStreamOptions,
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| OptionsError::ConfigFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text).map_err(|e| match e {
            CodecError::ConfigError { message } => OptionsError::ConfigFile {
                path: path.display().to_string(),
                reason: message,
            }
            .into(),
            other => other,
        })
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CodecError::config(e.to_string()))
    }

    pub fn with_recovery(mut self, scan_budget: u64) -> Self {
        self.recovery = RecoveryOptions {
            enabled: true,
            scan_budget,
        };
        self
    }

    pub fn with_fix_dts(mut self, fix: bool) -> Self {
        self.timestamps.fix = fix;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.timestamps.scale = scale;
        self
    }

    pub fn with_compensate(mut self, compensate: bool) -> Self {
        self.timestamps.compensate = compensate;
        self
    }

    pub fn with_warn_non_monotonic(mut self, warn: bool) -> Self {
        self.timestamps.warn_non_monotonic = warn;
        self
    }

    pub fn with_dts_offset(mut self, offset: i64) -> Self {
        self.dts_offset = offset;
        self
    }

    pub fn with_stream(mut self, tag_type: TagType, stream_id: u32) -> Self {
        self.streams.insert(tag_type, stream_id);
        self
    }

    pub fn with_crop(mut self, ranges: Vec<CropRange>, wait_keyframe: bool) -> Self {
        self.crop = ranges;
        self.crop_wait_keyframe = wait_keyframe;
        self
    }

    pub fn with_skip_meta(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.skip_meta.entry(key.into()).or_default().extend(values);
        self
    }

    pub fn with_split_streams(mut self, split: SplitStreamOptions) -> Self {
        self.split_streams = split;
        self
    }

    /// Reject settings no run can honor.
    pub fn validate(&self) -> Result<()> {
        let scale = self.timestamps.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(OptionsError::InvalidScale(scale).into());
        }
        for range in &self.crop {
            if range.start > range.stop {
                return Err(OptionsError::InvalidCropRange {
                    input: format!("{}..{}", range.start, range.stop),
                    reason: "start is after stop".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Build the drop filters in pipeline order: skip, substream, crop.
    pub fn filter_chain(&self) -> FilterChain {
        let mut chain = FilterChain::new();
        let skip = self
            .skip_meta
            .iter()
            .fold(MetaSkipFilter::new(), |f, (k, v)| f.with_rule(k.clone(), v.clone()));
        chain.add_filter(Box::new(skip));
        chain.add_filter(Box::new(
            self.streams
                .iter()
                .map(|(t, id)| (*t, *id))
                .collect::<SubstreamFilter>(),
        ));
        chain.add_filter(Box::new(CropEngine::new(
            self.crop.clone(),
            self.crop_wait_keyframe,
        )));
        chain
    }
}

/// Parse `start..stop` ranges separated by commas, e.g. `1000..2000,5000..6000`.
pub fn parse_crop_ranges(input: &str) -> std::result::Result<Vec<CropRange>, OptionsError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| {
            let invalid = |reason: &str| OptionsError::InvalidCropRange {
                input: item.to_string(),
                reason: reason.to_string(),
            };
            let (start, stop) = item
                .split_once("..")
                .ok_or_else(|| invalid("expected start..stop"))?;
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| invalid("start is not a number"))?;
            let stop: u32 = stop
                .trim()
                .parse()
                .map_err(|_| invalid("stop is not a number"))?;
            if start > stop {
                return Err(invalid("start is after stop"));
            }
            Ok(CropRange::new(start, stop))
        })
        .collect()
}

fn parse_type(name: &str) -> std::result::Result<TagType, OptionsError> {
    TagType::from_name(name.trim()).ok_or_else(|| OptionsError::UnknownTagType(name.to_string()))
}

/// Parse `type:id` pairs, e.g. `video:1,audio:0`.
pub fn parse_stream_selection(
    input: &str,
) -> std::result::Result<BTreeMap<TagType, u32>, OptionsError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| {
            let (name, id) = item.split_once(':').ok_or(OptionsError::MalformedEntry {
                input: item.to_string(),
                expected: "type:id",
            })?;
            let id = id
                .trim()
                .parse()
                .map_err(|_| OptionsError::InvalidNumber(id.to_string()))?;
            Ok((parse_type(name)?, id))
        })
        .collect()
}

/// Parse `type:path` pairs, e.g. `video:v.flv,audio:a.flv`.
pub fn parse_type_paths(
    input: &str,
) -> std::result::Result<BTreeMap<TagType, PathBuf>, OptionsError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| {
            let (name, path) = item.split_once(':').ok_or(OptionsError::MalformedEntry {
                input: item.to_string(),
                expected: "type:path",
            })?;
            Ok((parse_type(name)?, PathBuf::from(path.trim())))
        })
        .collect()
}

/// Parse `key=v1|v2` rules separated by commas.
pub fn parse_skip_rules(
    input: &str,
) -> std::result::Result<BTreeMap<String, Vec<String>>, OptionsError> {
    let mut rules: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, values) = item.split_once('=').ok_or(OptionsError::MalformedEntry {
            input: item.to_string(),
            expected: "key=value|value",
        })?;
        rules
            .entry(key.trim().to_string())
            .or_default()
            .extend(values.split('|').map(|v| v.to_string()));
    }
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::default();
        assert_eq!(options.timestamps.scale, 1.0);
        assert!(!options.recovery.enabled);
        assert_eq!(options.recovery.budget(), None);
        assert_eq!(options.split_streams.minimal_duration, 5000);
        assert_eq!(options.split_streams.stop_after, 5000);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_parse_crop_ranges() {
        let ranges = parse_crop_ranges("1000..2000, 5000..5000").unwrap();
        assert_eq!(
            ranges,
            vec![CropRange::new(1000, 2000), CropRange::new(5000, 5000)]
        );
        assert!(matches!(
            parse_crop_ranges("2000..1000"),
            Err(OptionsError::InvalidCropRange { .. })
        ));
        assert!(parse_crop_ranges("1000-2000").is_err());
        assert!(parse_crop_ranges("a..b").is_err());
    }

    #[test]
    fn test_parse_stream_selection() {
        let streams = parse_stream_selection("video:1,audio:0").unwrap();
        assert_eq!(streams.get(&TagType::Video), Some(&1));
        assert_eq!(streams.get(&TagType::Audio), Some(&0));
        assert_eq!(
            parse_stream_selection("data:1"),
            Err(OptionsError::UnknownTagType("data".to_string()))
        );
        assert!(parse_stream_selection("video").is_err());
        assert!(parse_stream_selection("video:x").is_err());
    }

    #[test]
    fn test_parse_skip_rules() {
        let rules = parse_skip_rules("encoder=Lavf|obs,creator=x").unwrap();
        assert_eq!(
            rules.get("encoder"),
            Some(&vec!["Lavf".to_string(), "obs".to_string()])
        );
        assert_eq!(rules.get("creator"), Some(&vec!["x".to_string()]));
        assert!(parse_skip_rules("novalue").is_err());
    }

    #[test]
    fn test_parse_type_paths() {
        let paths = parse_type_paths("video:out.flv,meta:out.flv").unwrap();
        assert_eq!(paths.get(&TagType::Video), Some(&PathBuf::from("out.flv")));
        assert_eq!(paths.get(&TagType::Meta), Some(&PathBuf::from("out.flv")));
        assert!(paths.get(&TagType::Audio).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_scale() {
        let err = PipelineOptions::new().with_scale(0.0).validate().unwrap_err();
        assert!(matches!(err, CodecError::ConfigError { .. }));
        assert!(PipelineOptions::new()
            .with_scale(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_crop() {
        let options = PipelineOptions::new().with_crop(vec![CropRange::new(10, 5)], false);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let options = PipelineOptions::from_toml_str(
            r#"
            crop = [{ start = 1000, stop = 2000 }]
            crop_wait_keyframe = true

            [recovery]
            enabled = true

            [timestamps]
            fix = true
            scale = 2.0

            [streams]
            video = 1

            [skip_meta]
            encoder = ["obs"]

            [split_streams]
            enabled = true
            minimal_duration = 3000
            "#,
        )
        .unwrap();
        assert_eq!(options.recovery.budget(), Some(0));
        assert!(options.timestamps.fix);
        assert_eq!(options.timestamps.scale, 2.0);
        assert_eq!(options.streams.get(&TagType::Video), Some(&1));
        assert_eq!(options.crop, vec![CropRange::new(1000, 2000)]);
        assert!(options.crop_wait_keyframe);
        assert_eq!(options.skip_meta.get("encoder").map(Vec::len), Some(1));
        assert_eq!(options.split_streams.minimal_duration, 3000);
        assert_eq!(options.split_streams.stop_after, 5000);
    }

    #[test]
    fn test_top_level_keys_before_tables() {
        let options = PipelineOptions::from_toml_str(
            r#"
            crop = [{ start = 1000, stop = 2000 }]
            crop_wait_keyframe = true

            [recovery]
            enabled = true
            scan_budget = 65536

            [timestamps]
            fix = true
            scale = 1.0

            [streams]
            video = 0

            [skip_meta]
            encoder = ["Lavf58.29.100"]
            "#,
        )
        .unwrap();
        assert_eq!(options.recovery.budget(), Some(65536));
        assert_eq!(options.streams.get(&TagType::Video), Some(&0));
        assert_eq!(options.crop, vec![CropRange::new(1000, 2000)]);
        assert!(options.crop_wait_keyframe);
    }

    #[test]
    fn test_invalid_scale_error() {
        assert_eq!(
            OptionsError::InvalidScale(-1.5),
            OptionsError::InvalidScale(-1.5)
        );
        assert_eq!(
            OptionsError::InvalidScale(0.0).to_string(),
            "scale must be a positive finite number, got 0"
        );
    }

    #[test]
    fn test_filter_chain_skips_noop_filters() {
        assert!(PipelineOptions::default().filter_chain().is_empty());
        let chain = PipelineOptions::new()
            .with_stream(TagType::Audio, 0)
            .with_crop(vec![CropRange::new(0, 10)], false)
            .filter_chain();
        assert_eq!(chain.filter_count(), 2);
    }

    #[test]
    fn test_options_error_converts_to_config_error() {
        let err: CodecError = OptionsError::UnknownTagType("x".to_string()).into();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
