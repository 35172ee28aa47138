// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application data types, independent of the GUI.

pub mod annotation;
pub mod patient;
pub mod report;
pub mod settings;
pub mod viewport;
pub mod volume;
