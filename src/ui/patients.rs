// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Patient management side panel.
//!
//! Lists patient folders with a search box, and the selected patient's
//! documents either as a filterable file list or as a timeline. Anything
//! that touches the store is returned as a [`PatientAction`] for the
//! application to carry out.

use crate::io::store::{self, PatientStore};
use crate::models::patient::{filter_documents, matches_query, timeline, Document, DocumentFilter, PatientId};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentTab {
    #[default]
    Files,
    Timeline,
}

/// Requests raised by the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PatientAction {
    None,
    Refresh,
    Select(PatientId),
    AddPatient,
    ImportFiles(PatientId),
    ExportFiles(PatientId),
    OpenFolder(PatientId),
    GenerateReport(PatientId),
    DeletePatient(PatientId),
    OpenDocument(PathBuf),
    RenameDocument(PatientId, String),
    DeleteDocument(PatientId, String),
}

#[derive(Debug, Default)]
pub struct PatientPanel {
    pub search: String,
    pub document_search: String,
    pub filter: DocumentFilter,
    pub tab: DocumentTab,
    patients: Vec<PatientId>,
    selected: Option<PatientId>,
    documents: Vec<Document>,
}

impl PatientPanel {
    /// Re-read the patient list. A selection that no longer exists is
    /// dropped; otherwise its documents are refreshed too.
    pub fn reload(&mut self, store: &PatientStore) -> store::Result<()> {
        self.patients = store.list_patients()?;
        match self.selected.clone() {
            Some(id) if self.patients.contains(&id) => self.reload_documents(store),
            _ => {
                self.clear_selection();
                Ok(())
            }
        }
    }

    pub fn select(&mut self, store: &PatientStore, id: PatientId) -> store::Result<()> {
        self.documents = store.list_documents(&id)?;
        self.selected = Some(id);
        Ok(())
    }

    pub fn reload_documents(&mut self, store: &PatientStore) -> store::Result<()> {
        if let Some(id) = &self.selected {
            self.documents = store.list_documents(id)?;
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.documents.clear();
    }

    pub fn selected(&self) -> Option<&PatientId> {
        self.selected.as_ref()
    }

    /// Patients matching the search box.
    pub fn visible_patients(&self) -> Vec<&PatientId> {
        self.patients
            .iter()
            .filter(|id| matches_query(id.as_str(), &self.search))
            .collect()
    }

    #[cfg(test)]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> PatientAction {
        let mut action = PatientAction::None;

        ui.heading("Patients");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.search).hint_text("Search patients"));
            if ui.button("⟳").on_hover_text("Refresh").clicked() {
                action = PatientAction::Refresh;
            }
        });
        ui.horizontal(|ui| {
            if ui.button("➕ Add Patient").clicked() {
                action = PatientAction::AddPatient;
            }
            let selected = self.selected.clone();
            if ui
                .add_enabled(selected.is_some(), egui::Button::new("📥 Import Files"))
                .clicked()
            {
                if let Some(id) = selected {
                    action = PatientAction::ImportFiles(id);
                }
            }
        });

        ui.separator();

        egui::ScrollArea::vertical()
            .id_source("patient_list")
            .max_height(ui.available_height() * 0.4)
            .show(ui, |ui| {
                let visible: Vec<PatientId> = self.visible_patients().into_iter().cloned().collect();
                if visible.is_empty() {
                    ui.label(egui::RichText::new("No patients").weak());
                }
                for id in visible {
                    let is_selected = self.selected.as_ref() == Some(&id);
                    let response = ui.selectable_label(is_selected, id.as_str());
                    if response.clicked() {
                        action = PatientAction::Select(id.clone());
                    }
                    response.context_menu(|ui| {
                        let mut entry = |ui: &mut egui::Ui, label: &str, make: fn(PatientId) -> PatientAction| {
                            if ui.button(label).clicked() {
                                action = make(id.clone());
                                ui.close_menu();
                            }
                        };
                        entry(ui, "Import Files", PatientAction::ImportFiles);
                        entry(ui, "Export Files", PatientAction::ExportFiles);
                        entry(ui, "Open Folder", PatientAction::OpenFolder);
                        entry(ui, "Generate Report", PatientAction::GenerateReport);
                        ui.separator();
                        entry(ui, "Delete Patient", PatientAction::DeletePatient);
                    });
                }
            });

        ui.separator();

        let Some(patient) = self.selected.clone() else {
            ui.label(egui::RichText::new("Select a patient to see their documents").weak());
            return action;
        };

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, DocumentTab::Files, "Files");
            ui.selectable_value(&mut self.tab, DocumentTab::Timeline, "Timeline");
        });

        match self.tab {
            DocumentTab::Files => {
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.document_search)
                            .hint_text("Search files")
                            .desired_width(140.0),
                    );
                    egui::ComboBox::from_id_source("document_filter")
                        .selected_text(self.filter.label())
                        .show_ui(ui, |ui| {
                            for filter in DocumentFilter::all() {
                                ui.selectable_value(&mut self.filter, *filter, filter.label());
                            }
                        });
                });

                egui::ScrollArea::vertical().id_source("document_list").show(ui, |ui| {
                    let shown = filter_documents(&self.documents, &self.document_search, self.filter);
                    if shown.is_empty() {
                        ui.label(egui::RichText::new("No documents").weak());
                    }
                    for document in shown {
                        document_row(ui, &patient, document, document.name.clone(), &mut action);
                    }
                });
            }
            DocumentTab::Timeline => {
                egui::ScrollArea::vertical().id_source("timeline").show(ui, |ui| {
                    for document in timeline(&self.documents) {
                        document_row(ui, &patient, document, document.timeline_label(), &mut action);
                    }
                });
            }
        }

        action
    }
}

/// One document entry: double-click opens it, right-click offers rename
/// and delete.
fn document_row(
    ui: &mut egui::Ui,
    patient: &PatientId,
    document: &Document,
    label: String,
    action: &mut PatientAction,
) {
    let response = ui
        .selectable_label(false, label)
        .on_hover_text(document.modified_label());
    if response.double_clicked() {
        *action = PatientAction::OpenDocument(document.path.clone());
    }
    response.context_menu(|ui| {
        if ui.button("Open").clicked() {
            *action = PatientAction::OpenDocument(document.path.clone());
            ui.close_menu();
        }
        if ui.button("Rename").clicked() {
            *action = PatientAction::RenameDocument(patient.clone(), document.name.clone());
            ui.close_menu();
        }
        if ui.button("Delete").clicked() {
            *action = PatientAction::DeleteDocument(patient.clone(), document.name.clone());
            ui.close_menu();
        }
    });
}
