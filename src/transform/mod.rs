// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-frame transformation stages.
//!
//! Frames pass through a [`FilterChain`] of [`FrameFilter`]s that decide
//! whether a frame is dropped, then through the [`TimestampReconciler`]
//! that rewrites the DTS of every admitted frame.
//!
//! # Example
//!
//! ```
//! use flvforge::io::formats::flv::{Frame, Tag, TagType};
//! use flvforge::transform::{CropEngine, CropRange, DropReason, FilterChain, SubstreamFilter};
//!
//! let mut chain = FilterChain::new();
//! chain.add_filter(Box::new(SubstreamFilter::new().with_stream(TagType::Video, 0)));
//! chain.add_filter(Box::new(CropEngine::new(vec![CropRange::new(1000, 2000)], false)));
//!
//! let frame = Frame::from(Tag::new(TagType::Video, 1500, 0, vec![0x27]));
//! assert_eq!(chain.evaluate(&frame).primary(), Some(DropReason::Crop));
//! ```

pub mod crop;
pub mod filter;
pub mod pipeline;
pub mod timestamp;

use std::fmt;

pub use crop::{CropEngine, CropRange};
pub use filter::{MetaSkipFilter, SubstreamFilter};
pub use pipeline::{FilterChain, Verdict};
pub use timestamp::{TimestampOptions, TimestampReconciler};

use crate::io::formats::flv::Frame;

/// Why a frame was removed from the main output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DropReason {
    /// onMetaData matched a configured skip rule
    MetaSkip,
    /// Substream id differs from the one selected for its type
    Substream,
    /// DTS inside a crop range
    Crop,
    /// Diverted to a per-substream split file
    SplitStream,
}

impl DropReason {
    pub fn name(self) -> &'static str {
        match self {
            DropReason::MetaSkip => "meta-skip",
            DropReason::Substream => "substream",
            DropReason::Crop => "crop",
            DropReason::SplitStream => "split-stream",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage that may drop frames.
///
/// Filters are stateful; every filter in a chain sees every frame, in
/// stream order, whether or not an earlier filter already dropped it.
pub trait FrameFilter {
    /// Reason reported when this filter drops a frame.
    fn reason(&self) -> DropReason;

    /// Decide whether `frame` is dropped.
    fn should_drop(&mut self, frame: &Frame) -> bool;

    /// True when the filter can never drop anything.
    fn is_noop(&self) -> bool {
        false
    }
}
