// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for the FLV container.

pub mod formats;
pub mod traits;

pub use formats::flv::{FlvHeader, FlvReader, FlvWriter, Frame, Tag, TagType};
pub use traits::FrameSink;
