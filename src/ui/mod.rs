// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the Smart Eye application.

pub mod canvas;
pub mod dialogs;
pub mod patients;
pub mod report_editor;
pub mod toolbar;
pub mod volume_view;
