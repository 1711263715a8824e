// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Container format implementations.
//!
//! - [`flv`]: FLV tag stream codec

pub mod flv;
