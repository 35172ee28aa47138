// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: media files, the patient store, reports and settings.

pub mod launch;
pub mod media;
pub mod report_pdf;
pub mod serialization;
pub mod store;
pub mod volume;
