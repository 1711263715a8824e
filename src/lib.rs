// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # flvforge
//!
//! Inspection, repair, and restructuring of FLV containers.
//!
//! The library is organized in layers:
//! - `core/` - Error taxonomy and the script value model
//! - `encoding/` - AMF0 codec for script tag bodies
//! - `io/` - FLV reader (with corruption recovery), writer, and frame model
//! - `transform/` - Timestamp reconciliation, crop, and drop filters
//! - `rewriter/` - Metadata regeneration, split files, and operating modes
//!
//! ## Example: Reading frames
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use flvforge::FlvReader;
//!
//! let mut reader = FlvReader::open("input.flv")?;
//! while let Some(frame) = reader.read_frame()? {
//!     println!("{frame}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Repairing timestamps and regenerating metadata
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use flvforge::{FlvRewriter, PipelineOptions};
//!
//! let options = PipelineOptions::new().with_recovery(0).with_fix_dts(true);
//! let mut rewriter = FlvRewriter::new(options)?;
//! let stats = rewriter.rewrite("broken.flv", "fixed.flv", true)?;
//! println!("recovered {} corrupt tags", stats.recovered);
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{CodecError, Properties, Result, ScriptValue};

// AMF0 codec
pub mod encoding;

// Container I/O
pub mod io;

pub use io::traits::FrameSink;
pub use io::{FlvHeader, FlvReader, FlvWriter, Frame, Tag, TagType};

// Frame transformations
pub mod transform;

pub use transform::{CropRange, DropReason, TimestampOptions, TimestampReconciler};

// Operating modes
pub mod rewriter;

pub use rewriter::{
    FlvRewriter, MetadataBuilder, MetadataReport, PipelineEngine, PipelineOptions, RewriteStats,
};
