// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Pipeline orchestration: options, metadata regeneration, split files,
//! the frame engine, and the mode facade.

pub mod engine;
pub mod facade;
pub mod metadata;
pub mod options;
pub mod sink;
pub mod split;

pub use engine::PipelineEngine;
pub use facade::{FlvRewriter, RewriteStats};
pub use metadata::{scan_metadata, KeyframeEntry, MetadataBuilder, MetadataReport};
pub use options::{
    parse_crop_ranges, parse_skip_rules, parse_stream_selection, parse_type_paths, OptionsError,
    PipelineOptions, RecoveryOptions, SplitStreamOptions,
};
pub use sink::{ContentSplitSink, DumpSink};
pub use split::{SplitClose, StreamSplitter};
