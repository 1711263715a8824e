// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! DTS-range cropping.
//!
//! Ranges are inclusive and consumed strictly in order. With
//! `wait_keyframe` set, exclusion only begins and ends on a video keyframe,
//! so cut points fall on GOP boundaries.

use serde::{Deserialize, Serialize};

use super::{DropReason, FrameFilter};
use crate::io::formats::flv::Frame;

/// Inclusive DTS range in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRange {
    pub start: u32,
    pub stop: u32,
}

impl CropRange {
    pub fn new(start: u32, stop: u32) -> Self {
        Self { start, stop }
    }

    pub fn contains(&self, dts: u32) -> bool {
        self.start <= dts && dts <= self.stop
    }
}

/// Crop state machine.
#[derive(Debug, Clone)]
pub struct CropEngine {
    ranges: Vec<CropRange>,
    wait_keyframe: bool,
    index: usize,
    active: bool,
}

impl CropEngine {
    pub fn new(ranges: Vec<CropRange>, wait_keyframe: bool) -> Self {
        Self {
            ranges,
            wait_keyframe,
            index: 0,
            active: false,
        }
    }

    /// Index of the range currently being matched.
    pub fn range_index(&self) -> usize {
        self.index
    }

    /// Whether exclusion is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance the state machine by one frame; true when the frame is cropped.
    pub fn check(&mut self, frame: &Frame) -> bool {
        let Some(range) = self.ranges.get(self.index) else {
            return false;
        };
        let keyframe = frame.is_video_keyframe();

        if range.contains(frame.dts()) {
            if self.wait_keyframe && !self.active {
                if keyframe {
                    self.active = true;
                    return true;
                }
                return false;
            }
            self.active = true;
            return true;
        }

        if self.active && (!self.wait_keyframe || keyframe) {
            self.index += 1;
            self.active = false;
            return false;
        }
        // Still excluding until the next keyframe.
        self.active && self.wait_keyframe
    }
}

impl FrameFilter for CropEngine {
    fn reason(&self) -> DropReason {
        DropReason::Crop
    }

    fn should_drop(&mut self, frame: &Frame) -> bool {
        self.check(frame)
    }

    fn is_noop(&self) -> bool {
        self.ranges.is_empty()
    }
}
