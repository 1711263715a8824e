// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Output DTS computation.
//!
//! For every admitted frame the output DTS is
//!
//! ```text
//! trunc(dts * scale) + offset - compensation + shift[type, stream]
//! ```
//!
//! where `compensation` accumulates the time removed by dropped frames and
//! `shift` carries forward the correction made the last time the
//! (type, substream) clock went backwards with fixing enabled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::io::formats::flv::{Frame, TagType};

/// DTS rewriting settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampOptions {
    /// Replace non-monotonic DTS values by extrapolation
    pub fix: bool,
    /// Linear factor applied to every input DTS
    pub scale: f64,
    /// Subtract the span of every dropped frame, not only cropped ones
    pub compensate: bool,
    /// Log a warning for every non-monotonic DTS
    pub warn_non_monotonic: bool,
}

impl Default for TimestampOptions {
    fn default() -> Self {
        Self {
            fix: false,
            scale: 1.0,
            compensate: false,
            warn_non_monotonic: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StreamClock {
    last_out: Option<i64>,
    last_delta: i64,
    shift: i64,
}

/// Per-run DTS state keyed by (type, substream).
#[derive(Debug, Clone)]
pub struct TimestampReconciler {
    options: TimestampOptions,
    base_offset: i64,
    clocks: HashMap<(TagType, u32), StreamClock>,
    compensation: i64,
    last_input_dts: Option<u32>,
    output_offset: i64,
    non_monotonic: u64,
    corrected: u64,
}

impl TimestampReconciler {
    /// Create a reconciler whose output starts at `base_offset`.
    pub fn new(options: TimestampOptions, base_offset: i64) -> Self {
        Self {
            options,
            base_offset,
            clocks: HashMap::new(),
            compensation: 0,
            last_input_dts: None,
            output_offset: base_offset,
            non_monotonic: 0,
            corrected: 0,
        }
    }

    /// Last output DTS of the primary substream, or the base offset.
    ///
    /// Continuation base for the next input of a concatenation and the base
    /// DTS used by the stream splitter.
    pub fn output_offset(&self) -> i64 {
        self.output_offset
    }

    /// Milliseconds removed so far.
    pub fn compensation(&self) -> i64 {
        self.compensation
    }

    /// Number of non-monotonic DTS values seen.
    pub fn non_monotonic_count(&self) -> u64 {
        self.non_monotonic
    }

    /// Number of DTS values replaced by extrapolation.
    pub fn corrected_count(&self) -> u64 {
        self.corrected
    }

    /// Account for a frame that will not reach the main output.
    ///
    /// With `compensate` the time since the previous input frame is removed
    /// from the output timeline.
    pub fn note_dropped(&mut self, frame: &Frame, compensate: bool) {
        let dts = frame.dts();
        if compensate {
            if let Some(last) = self.last_input_dts {
                self.compensation += i64::from(dts.saturating_sub(last));
            }
        }
        self.last_input_dts = Some(dts);
    }

    /// Whether a drop should be compensated under the configured options.
    pub fn compensates(&self, cropped: bool) -> bool {
        cropped || self.options.compensate
    }

    /// Rewrite the DTS of an admitted frame and return the new value.
    pub fn reconcile(&mut self, frame: &mut Frame) -> u32 {
        let dts = frame.dts();
        let stream = frame.stream_id();
        let key = (frame.tag_type(), stream);
        self.last_input_dts = Some(dts);

        let scaled = (f64::from(dts) * self.options.scale) as i64;
        let clock = self.clocks.entry(key).or_default();
        let mut out = scaled + self.base_offset - self.compensation + clock.shift;

        if let Some(last) = clock.last_out {
            if last > out {
                self.non_monotonic += 1;
                if self.options.warn_non_monotonic {
                    warn!(
                        context = "timestamp",
                        tag_type = %key.0,
                        stream,
                        last,
                        current = out,
                        "non monotonically increasing dts"
                    );
                }
                if self.options.fix {
                    let replacement = last + clock.last_delta;
                    clock.shift += replacement - out;
                    out = replacement;
                    self.corrected += 1;
                }
            }
            clock.last_delta = out - last;
        }
        clock.last_out = Some(out);

        let out = out.clamp(0, i64::from(u32::MAX)) as u32;
        if stream == 0 {
            self.output_offset = i64::from(out);
        }
        frame.set_dts(out);
        out
    }
}
