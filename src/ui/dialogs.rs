// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Modal message, confirmation and text prompt windows.
//!
//! Dialogs are queued and shown one at a time. While one is open the rest
//! of the window is disabled by the caller (see [`Dialogs::is_open`]).

use crate::models::patient::PatientId;
use std::collections::VecDeque;

/// What a confirmation dialog does when accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAction {
    DeletePatient(PatientId),
    DeleteDocument(PatientId, String),
}

/// What a prompt does with the entered text.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptAction {
    CreatePatient,
    RenameDocument(PatientId, String),
}

#[derive(Debug, Clone, PartialEq)]
enum Dialog {
    Info { title: String, message: String },
    Warning { title: String, message: String },
    Confirm { title: String, message: String, action: ConfirmAction },
    Prompt { title: String, label: String, text: String, action: PromptAction },
}

/// Result of the dialog shown this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogOutcome {
    None,
    Confirmed(ConfirmAction),
    Submitted(PromptAction, String),
}

#[derive(Debug, Default)]
pub struct Dialogs {
    queue: VecDeque<Dialog>,
}

impl Dialogs {
    pub fn is_open(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.queue.push_back(Dialog::Info {
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn warning(&mut self, title: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.queue.push_back(Dialog::Warning {
            title: title.into(),
            message,
        });
    }

    pub fn confirm(&mut self, title: impl Into<String>, message: impl Into<String>, action: ConfirmAction) {
        self.queue.push_back(Dialog::Confirm {
            title: title.into(),
            message: message.into(),
            action,
        });
    }

    pub fn prompt(
        &mut self,
        title: impl Into<String>,
        label: impl Into<String>,
        initial: impl Into<String>,
        action: PromptAction,
    ) {
        self.queue.push_back(Dialog::Prompt {
            title: title.into(),
            label: label.into(),
            text: initial.into(),
            action,
        });
    }

    /// Show the front dialog and pop it once answered.
    pub fn show(&mut self, ctx: &egui::Context) -> DialogOutcome {
        let Some(dialog) = self.queue.front_mut() else {
            return DialogOutcome::None;
        };

        let title = match dialog {
            Dialog::Info { title, .. }
            | Dialog::Warning { title, .. }
            | Dialog::Confirm { title, .. }
            | Dialog::Prompt { title, .. } => title.clone(),
        };

        let mut closed = false;
        let mut outcome = DialogOutcome::None;

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| match dialog {
                Dialog::Info { message, .. } => {
                    ui.label(message.as_str());
                    ui.add_space(8.0);
                    closed = ui.button("OK").clicked();
                }
                Dialog::Warning { message, .. } => {
                    ui.label(egui::RichText::new(message.as_str()).color(ui.visuals().warn_fg_color));
                    ui.add_space(8.0);
                    closed = ui.button("OK").clicked();
                }
                Dialog::Confirm { message, action, .. } => {
                    ui.label(message.as_str());
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("Yes").clicked() {
                            outcome = DialogOutcome::Confirmed(action.clone());
                            closed = true;
                        }
                        if ui.button("No").clicked() {
                            closed = true;
                        }
                    });
                }
                Dialog::Prompt { label, text, action, .. } => {
                    ui.label(label.as_str());
                    let edit = ui.text_edit_singleline(text);
                    edit.request_focus();
                    let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("OK").clicked() || entered {
                            outcome = DialogOutcome::Submitted(action.clone(), text.clone());
                            closed = true;
                        }
                        if ui.button("Cancel").clicked() {
                            closed = true;
                        }
                    });
                }
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            closed = true;
            outcome = DialogOutcome::None;
        }
        if closed {
            self.queue.pop_front();
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogs_queue_in_order() {
        let mut dialogs = Dialogs::default();
        assert!(!dialogs.is_open());

        dialogs.info("Report", "Saved as Report_20250101_120000.pdf");
        dialogs.confirm(
            "Delete",
            "Delete this patient?",
            ConfirmAction::DeletePatient(PatientId::new("Ada_20250101_120000")),
        );
        assert!(dialogs.is_open());
        assert_eq!(dialogs.queue.len(), 2);
        assert!(matches!(dialogs.queue.front(), Some(Dialog::Info { .. })));
    }

    #[test]
    fn test_prompt_starts_with_initial_text() {
        let mut dialogs = Dialogs::default();
        let id = PatientId::new("Ada_20250101_120000");
        dialogs.prompt(
            "Rename",
            "New name:",
            "fundus.png",
            PromptAction::RenameDocument(id, "fundus.png".to_string()),
        );
        match dialogs.queue.front() {
            Some(Dialog::Prompt { text, .. }) => assert_eq!(text, "fundus.png"),
            other => panic!("unexpected dialog {other:?}"),
        }
    }
}
