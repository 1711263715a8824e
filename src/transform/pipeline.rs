// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Ordered chain of frame filters.

use std::fmt;

use super::{DropReason, FrameFilter};
use crate::io::formats::flv::Frame;

/// Outcome of running a frame through a [`FilterChain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    reasons: Vec<DropReason>,
}

impl Verdict {
    /// A verdict that admits the frame.
    pub fn admit() -> Self {
        Self::default()
    }

    /// Record one more reason to drop the frame.
    pub fn add(&mut self, reason: DropReason) {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }

    pub fn is_admitted(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn contains(&self, reason: DropReason) -> bool {
        self.reasons.contains(&reason)
    }

    /// First reason, in chain order.
    pub fn primary(&self) -> Option<DropReason> {
        self.reasons.first().copied()
    }
}

/// Runs filters in the order they were added.
///
/// Every filter is evaluated for every frame so that stateful filters such
/// as the crop engine track the full stream.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn FrameFilter>>,
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filter_count", &self.filters.len())
            .finish()
    }
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter. No-op filters are discarded.
    pub fn add_filter(&mut self, filter: Box<dyn FrameFilter>) {
        if !filter.is_noop() {
            self.filters.push(filter);
        }
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Evaluate every filter against `frame`.
    pub fn evaluate(&mut self, frame: &Frame) -> Verdict {
        let mut verdict = Verdict::admit();
        for filter in &mut self.filters {
            if filter.should_drop(frame) {
                verdict.add(filter.reason());
            }
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::formats::flv::{Tag, TagType};

    /// Counts how many frames it has seen and drops every other one.
    struct Alternate {
        seen: usize,
    }

    impl FrameFilter for Alternate {
        fn reason(&self) -> DropReason {
            DropReason::Substream
        }

        fn should_drop(&mut self, _frame: &Frame) -> bool {
            self.seen += 1;
            self.seen % 2 == 0
        }
    }

    struct Always(DropReason);

    impl FrameFilter for Always {
        fn reason(&self) -> DropReason {
            self.0
        }

        fn should_drop(&mut self, _frame: &Frame) -> bool {
            true
        }
    }

    fn frame() -> Frame {
        Frame::from(Tag::new(TagType::Audio, 0, 0, vec![0xAF]))
    }

    #[test]
    fn test_empty_chain_admits() {
        let mut chain = FilterChain::new();
        assert!(chain.is_empty());
        assert!(chain.evaluate(&frame()).is_admitted());
    }

    #[test]
    fn test_all_filters_see_every_frame() {
        let mut chain = FilterChain::new();
        chain.add_filter(Box::new(Always(DropReason::MetaSkip)));
        chain.add_filter(Box::new(Alternate { seen: 0 }));

        let first = chain.evaluate(&frame());
        assert_eq!(first.primary(), Some(DropReason::MetaSkip));
        assert!(!first.contains(DropReason::Substream));

        let second = chain.evaluate(&frame());
        assert_eq!(second.primary(), Some(DropReason::MetaSkip));
        assert!(second.contains(DropReason::Substream));
    }

    #[test]
    fn test_verdict_dedups_reasons() {
        let mut verdict = Verdict::admit();
        verdict.add(DropReason::Crop);
        verdict.add(DropReason::Crop);
        verdict.add(DropReason::SplitStream);
        assert_eq!(verdict.primary(), Some(DropReason::Crop));
        assert!(verdict.contains(DropReason::SplitStream));
        assert!(!verdict.is_admitted());
    }
}
