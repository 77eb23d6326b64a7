// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Utility modules
//!
//! Common utilities for the convoy CLI.

pub mod spinner;

pub use spinner::*;
