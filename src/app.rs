// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! [`SmartEyeApp`] owns one [`AppState`] and drives it once per frame:
//! finished background jobs are applied first, then the menu bar, the
//! action bar, the patient panel, the central view, the report editor and
//! finally any open dialog.

use crate::io::store::{PatientStore, StoreError, TransferReport};
use crate::io::{launch, media, report_pdf, volume as volume_io};
use crate::models::patient::PatientId;
use crate::models::settings::Settings;
use crate::models::viewport::{ImageCanvas, ZoomDirection};
use crate::models::volume::Volume;
use crate::ui::dialogs::{ConfirmAction, DialogOutcome, Dialogs, PromptAction};
use crate::ui::patients::{PatientAction, PatientPanel};
use crate::ui::report_editor::{EditorAction, ReportEditor};
use crate::ui::volume_view::VolumeViewer;
use crate::ui::{canvas, toolbar};
use anyhow::Context;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};

/// What the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainView {
    #[default]
    Welcome,
    Canvas,
    Volume,
}

/// Kind of background job, used to route its result and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    OpenImage,
    OpenVolume,
    SaveImage,
    ImportFiles,
    ExportFiles,
    ReportImage,
    SaveReport,
}

impl JobKind {
    fn message(self) -> &'static str {
        match self {
            JobKind::OpenImage => "Loading image...",
            JobKind::OpenVolume => "Loading medical image...",
            JobKind::SaveImage => "Saving image...",
            JobKind::ImportFiles => "Importing files...",
            JobKind::ExportFiles => "Exporting files...",
            JobKind::ReportImage => "Loading image...",
            JobKind::SaveReport => "Writing report...",
        }
    }
}

/// Result of a background job.
enum JobOutput {
    Image(RgbaImage),
    Volume(Volume),
    ImageSaved(PathBuf),
    Imported(PatientId, TransferReport),
    Exported(PathBuf, TransferReport),
    ReportImage(RgbaImage),
    ReportSaved(PatientId, PathBuf),
}

struct Job {
    kind: JobKind,
    receiver: Receiver<anyhow::Result<JobOutput>>,
}

/// Everything the application knows, in one place.
pub struct AppState {
    pub settings: Settings,
    pub store: Option<PatientStore>,
    pub view: MainView,
    pub canvas: ImageCanvas,
    pub canvas_texture: Option<egui::TextureHandle>,
    /// Shown instead of the canvas, e.g. after a failed load
    pub canvas_status: Option<String>,
    /// Last canvas viewport size, for menu zooms
    pub canvas_viewport: egui::Vec2,
    pub volume_viewer: VolumeViewer,
    pub show_patients: bool,
    pub patients: PatientPanel,
    pub report: Option<ReportEditor>,
    pub dialogs: Dialogs,
    pub show_about: bool,
    jobs: Vec<Job>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let mut dialogs = Dialogs::default();
        let mut patients = PatientPanel::default();

        let store = match PatientStore::open(settings.data_root.clone()) {
            Ok(store) => {
                if let Err(e) = patients.reload(&store) {
                    dialogs.warning("Patients", format!("Could not list patients: {e}"));
                }
                Some(store)
            }
            Err(e) => {
                dialogs.warning("Patients", format!("Patient store unavailable: {e}"));
                None
            }
        };

        Self {
            canvas: ImageCanvas::new(settings.brush(), settings.zoom_limits()),
            settings,
            store,
            view: MainView::default(),
            canvas_texture: None,
            canvas_status: None,
            canvas_viewport: egui::Vec2::ZERO,
            volume_viewer: VolumeViewer::default(),
            show_patients: true,
            patients,
            report: None,
            dialogs,
            show_about: false,
            jobs: Vec::new(),
        }
    }

    /// Run `work` on a background thread; its result is applied by
    /// [`Self::poll_jobs`].
    fn spawn_job<F>(&mut self, kind: JobKind, work: F)
    where
        F: FnOnce() -> anyhow::Result<JobOutput> + Send + 'static,
    {
        let (sender, receiver) = channel();
        std::thread::spawn(move || {
            let _ = sender.send(work());
        });
        self.jobs.push(Job { kind, receiver });
    }

    fn loading_message(&self) -> Option<&'static str> {
        self.jobs.first().map(|job| job.kind.message())
    }

    /// Apply every finished job.
    fn poll_jobs(&mut self) {
        let mut finished = Vec::new();
        self.jobs.retain(|job| match job.receiver.try_recv() {
            Ok(result) => {
                finished.push((job.kind, result));
                false
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => true,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                finished.push((job.kind, Err(anyhow::anyhow!("background job stopped"))));
                false
            }
        });

        for (kind, result) in finished {
            match result {
                Ok(output) => self.apply_output(output),
                Err(e) => self.job_failed(kind, e),
            }
        }
    }

    fn apply_output(&mut self, output: JobOutput) {
        match output {
            JobOutput::Image(pixels) => {
                self.canvas.set_image(pixels);
                self.canvas_texture = None;
                self.canvas_status = None;
                self.view = MainView::Canvas;
            }
            JobOutput::Volume(volume) => {
                self.volume_viewer.load(volume);
                self.view = MainView::Volume;
            }
            JobOutput::ImageSaved(path) => {
                self.dialogs.info("Image Saved", format!("Saved as {}", path.display()));
            }
            JobOutput::Imported(patient, report) => {
                if self.patients.selected() == Some(&patient) {
                    self.refresh_documents();
                }
                self.report_transfer("Import", "Imported", &report);
            }
            JobOutput::Exported(dest, report) => {
                if report.is_empty() {
                    self.dialogs.info("Export", "Nothing to export.");
                } else {
                    log::info!("Exported to {}", dest.display());
                    self.report_transfer("Export", "Exported", &report);
                }
            }
            JobOutput::ReportImage(pixels) => {
                if let Some(editor) = self.report.as_mut() {
                    editor.insert_image(pixels);
                }
            }
            JobOutput::ReportSaved(patient, path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                self.dialogs.info("Report", format!("Saved as {name}"));
                if self.patients.selected() == Some(&patient) {
                    self.refresh_documents();
                }
                self.report = None;
            }
        }
    }

    fn job_failed(&mut self, kind: JobKind, error: anyhow::Error) {
        log::error!("{:?} failed: {:#}", kind, error);
        match kind {
            JobKind::OpenImage => {
                self.canvas_status = Some(canvas::LOAD_FAILED.to_string());
                self.view = MainView::Canvas;
            }
            JobKind::OpenVolume => {
                self.volume_viewer.reset();
                self.view = MainView::Volume;
            }
            JobKind::ReportImage => {
                self.dialogs.warning("Insert Image", "Failed to load image.");
            }
            JobKind::SaveReport => {
                if let Some(editor) = self.report.as_mut() {
                    editor.save_failed();
                }
                self.dialogs.warning("Report", format!("{error:#}"));
            }
            JobKind::SaveImage | JobKind::ImportFiles | JobKind::ExportFiles => {
                self.dialogs.warning("Error", format!("{error:#}"));
            }
        }
    }

    fn report_transfer(&mut self, title: &str, verb: &str, report: &TransferReport) {
        if report.failed.is_empty() {
            self.dialogs
                .info(title, format!("{} {} file(s).", verb, report.copied.len()));
        } else {
            let failures: Vec<String> = report
                .failed
                .iter()
                .map(|(path, reason)| format!("{}: {}", path.display(), reason))
                .collect();
            self.dialogs.warning(
                title,
                format!(
                    "{} {} file(s), {} failed:\n{}",
                    verb,
                    report.copied.len(),
                    report.failed.len(),
                    failures.join("\n")
                ),
            );
        }
    }

    fn store_failed(&mut self, error: StoreError) {
        self.dialogs.warning("Patients", error.to_string());
    }

    fn refresh_patients(&mut self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = self.patients.reload(store) {
            self.store_failed(e);
        }
    }

    fn refresh_documents(&mut self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = self.patients.reload_documents(store) {
            self.store_failed(e);
        }
    }

    /// Open a bitmap in the annotation canvas.
    pub fn open_image_viewer(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &media::VIEWER_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        self.spawn_job(JobKind::OpenImage, move || {
            media::load_image(&path)
                .map(JobOutput::Image)
                .context("Failed to load image")
        });
    }

    /// Open a DICOM or NIfTI file in the volume viewer.
    pub fn open_medical_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Medical Images", &volume_io::VOLUME_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        self.spawn_job(JobKind::OpenVolume, move || {
            volume_io::load_volume(&path)
                .map(JobOutput::Volume)
                .context("Failed to load medical image")
        });
    }

    /// Save the flattened annotated image as PNG.
    pub fn save_annotated_image(&mut self) {
        let Some(composite) = self.canvas.export() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("annotated.png")
            .save_file()
        else {
            return;
        };
        self.spawn_job(JobKind::SaveImage, move || {
            media::save_png(&composite, &path)?;
            Ok(JobOutput::ImageSaved(path))
        });
    }

    fn zoom_canvas(&mut self, direction: ZoomDirection) {
        let center = self.canvas_viewport / 2.0;
        self.canvas.zoom(direction, [center.x, center.y]);
    }

    /// Reports an empty or unreadable patient folder before any folder picker opens.
    fn has_documents_to_export(&mut self, store: &PatientStore, id: &PatientId) -> bool {
        match store.list_documents(id) {
            Ok(documents) if documents.is_empty() => {
                self.dialogs.info("Export", "Nothing to export.");
                false
            }
            Ok(_) => true,
            Err(e) => {
                self.store_failed(e);
                false
            }
        }
    }

    fn handle_patient_action(&mut self, action: PatientAction) {
        if action == PatientAction::None {
            return;
        }
        let Some(store) = self.store.clone() else {
            return;
        };

        match action {
            PatientAction::None => {}
            PatientAction::Refresh => self.refresh_patients(),
            PatientAction::Select(id) => {
                if let Err(e) = self.patients.select(&store, id) {
                    self.store_failed(e);
                }
            }
            PatientAction::AddPatient => {
                self.dialogs
                    .prompt("Add Patient", "Patient name:", "", PromptAction::CreatePatient);
            }
            PatientAction::ImportFiles(id) => {
                let Some(sources) = rfd::FileDialog::new().pick_files() else {
                    return;
                };
                self.spawn_job(JobKind::ImportFiles, move || {
                    let report = store.import_files(&id, &sources)?;
                    Ok(JobOutput::Imported(id, report))
                });
            }
            PatientAction::ExportFiles(id) => {
                if !self.has_documents_to_export(&store, &id) {
                    return;
                }
                let Some(dest) = rfd::FileDialog::new().pick_folder() else {
                    return;
                };
                self.spawn_job(JobKind::ExportFiles, move || {
                    let report = store
                        .export_files(&id, &dest)
                        .with_context(|| format!("Export of {id} failed"))?;
                    Ok(JobOutput::Exported(dest, report))
                });
            }
            PatientAction::OpenFolder(id) => {
                if let Err(e) = launch::open_path(&store.patient_path(&id)) {
                    self.dialogs.warning("Open Folder", e.to_string());
                }
            }
            PatientAction::GenerateReport(id) => {
                log::info!("Report editor opened for {}", id);
                self.report = Some(ReportEditor::new(id, self.settings.report_font_size));
            }
            PatientAction::DeletePatient(id) => {
                self.dialogs.confirm(
                    "Delete Patient",
                    format!("Delete {id} and all of their documents?"),
                    ConfirmAction::DeletePatient(id),
                );
            }
            PatientAction::OpenDocument(path) => {
                if let Err(e) = launch::open_path(&path) {
                    self.dialogs.warning("Open File", e.to_string());
                }
            }
            PatientAction::RenameDocument(id, name) => {
                self.dialogs.prompt(
                    "Rename File",
                    "New name:",
                    name.clone(),
                    PromptAction::RenameDocument(id, name),
                );
            }
            PatientAction::DeleteDocument(id, name) => {
                self.dialogs.confirm(
                    "Delete File",
                    format!("Delete {name}?"),
                    ConfirmAction::DeleteDocument(id, name),
                );
            }
        }
    }

    fn handle_dialog_outcome(&mut self, outcome: DialogOutcome) {
        if outcome == DialogOutcome::None {
            return;
        }
        let Some(store) = self.store.clone() else {
            return;
        };

        let result = match outcome {
            DialogOutcome::None => return,
            DialogOutcome::Confirmed(ConfirmAction::DeletePatient(id)) => {
                if self.report.as_ref().map(|r| r.patient()) == Some(&id) {
                    self.report = None;
                }
                store.delete_patient(&id)
            }
            DialogOutcome::Confirmed(ConfirmAction::DeleteDocument(id, name)) => {
                store.delete_document(&id, &name)
            }
            DialogOutcome::Submitted(PromptAction::CreatePatient, name) => {
                store.create_patient(&name).and_then(|id| {
                    self.patients.reload(&store)?;
                    self.patients.select(&store, id)
                })
            }
            DialogOutcome::Submitted(PromptAction::RenameDocument(id, old), new) => {
                store.rename_document(&id, &old, &new)
            }
        };

        if let Err(e) = result {
            self.store_failed(e);
        }
        self.refresh_patients();
    }

    fn handle_editor_action(&mut self, action: EditorAction) {
        match action {
            EditorAction::None => {}
            EditorAction::Close => {
                self.report = None;
            }
            EditorAction::InsertImage => {
                let Some(path) = rfd::FileDialog::new()
                    .add_filter("Images", &media::REPORT_IMAGE_EXTENSIONS)
                    .pick_file()
                else {
                    return;
                };
                self.spawn_job(JobKind::ReportImage, move || {
                    Ok(JobOutput::ReportImage(media::load_image(&path)?))
                });
            }
            EditorAction::Save => {
                let (Some(store), Some(editor)) = (self.store.as_ref(), self.report.as_mut()) else {
                    return;
                };
                let patient = editor.patient().clone();
                let path = report_pdf::report_path(&store.patient_path(&patient));
                let draft = editor.draft().clone();
                let layout = editor.layout();
                editor.set_saving();

                self.spawn_job(JobKind::SaveReport, move || {
                    report_pdf::write_report(&draft, &layout, &path)?;
                    Ok(JobOutput::ReportSaved(patient, path))
                });
            }
        }
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Image...").clicked() {
                    self.open_image_viewer();
                    ui.close_menu();
                }
                if ui.button("Open Medical Image...").clicked() {
                    self.open_medical_image();
                    ui.close_menu();
                }
                let can_save = self.canvas.has_image();
                if ui
                    .add_enabled(can_save, egui::Button::new("Save Annotated Image..."))
                    .clicked()
                {
                    self.save_annotated_image();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                let on_canvas = self.view == MainView::Canvas && self.canvas.has_image();
                if ui.add_enabled(on_canvas, egui::Button::new("Zoom In")).clicked() {
                    self.zoom_canvas(ZoomDirection::In);
                    ui.close_menu();
                }
                if ui.add_enabled(on_canvas, egui::Button::new("Zoom Out")).clicked() {
                    self.zoom_canvas(ZoomDirection::Out);
                    ui.close_menu();
                }
                if ui.add_enabled(on_canvas, egui::Button::new("Reset Zoom")).clicked() {
                    self.canvas.reset_zoom();
                    ui.close_menu();
                }
                ui.separator();
                if ui.checkbox(&mut self.show_patients, "Patient Management").clicked() {
                    ui.close_menu();
                }
            });

            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    self.show_about = true;
                    ui.close_menu();
                }
            });
        });
    }

    fn action_bar(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        ui.heading("Ophthalmology Assistant");
        ui.horizontal(|ui| {
            if ui.button("Load Medical Image").clicked() {
                self.open_medical_image();
            }
            if ui.button("Open Image Viewer").clicked() {
                self.open_image_viewer();
            }
            if ui.button("Open Teams").clicked() {
                log::info!("Opening {}", self.settings.teams_url);
                ui.ctx().open_url(egui::OpenUrl::new_tab(&self.settings.teams_url));
            }
            ui.toggle_value(&mut self.show_patients, "Patient Management");
        });
        ui.add_space(4.0);
    }

    fn central_view(&mut self, ui: &mut egui::Ui) {
        if let Some(message) = self.loading_message() {
            if matches!(self.jobs.first().map(|j| j.kind), Some(JobKind::OpenImage | JobKind::OpenVolume)) {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.spinner();
                        ui.add_space(10.0);
                        ui.label(
                            egui::RichText::new(message)
                                .size(16.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                    });
                });
                return;
            }
        }

        match self.view {
            MainView::Welcome => {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.heading(
                            egui::RichText::new("Smart Eye")
                                .size(32.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                        ui.add_space(20.0);
                        ui.label(
                            egui::RichText::new("Load a medical image or open the image viewer to begin")
                                .color(egui::Color32::from_gray(180)),
                        );
                    });
                });
            }
            MainView::Canvas => {
                self.canvas_viewport = canvas::show(
                    ui,
                    &mut self.canvas,
                    &mut self.canvas_texture,
                    self.canvas_status.as_deref(),
                );
            }
            MainView::Volume => self.volume_viewer.show(ui),
        }
    }

    fn about_window(&mut self, ctx: &egui::Context) {
        if !self.show_about {
            return;
        }
        egui::Window::new("About Smart Eye")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("Smart Eye");
                    ui.label("Ophthalmology Assistant");
                    ui.add_space(8.0);
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(8.0);
                    if ui.button("Close").clicked() {
                        self.show_about = false;
                    }
                });
            });
    }
}

/// Main application.
pub struct SmartEyeApp {
    state: AppState,
}

impl SmartEyeApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
        }
    }
}

impl eframe::App for SmartEyeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = &mut self.state;
        state.poll_jobs();

        // Keep polling while jobs run
        if !state.jobs.is_empty() {
            ctx.request_repaint();
        }

        let enabled = !state.dialogs.is_open();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| state.menu_bar(ui));
        });

        egui::TopBottomPanel::top("action_bar").show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| state.action_bar(ui));
        });

        if state.view == MainView::Canvas && state.canvas.has_image() {
            let action = egui::TopBottomPanel::top("toolbar")
                .show(ctx, |ui| {
                    ui.add_enabled_ui(enabled, |ui| toolbar::show(ui, &mut state.canvas)).inner
                })
                .inner;
            if action == toolbar::ToolbarAction::SaveImage {
                state.save_annotated_image();
            }
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match state.loading_message() {
                    Some(message) => {
                        ui.spinner();
                        ui.label(message);
                    }
                    None => {
                        ui.label("Ready");
                    }
                }
                if let Some(store) = &state.store {
                    ui.separator();
                    ui.label(format!("Patients: {}", store.root().display()));
                }
            });
        });

        if state.show_patients {
            let action = egui::SidePanel::right("patients")
                .default_width(300.0)
                .show(ctx, |ui| {
                    ui.add_enabled_ui(enabled && state.store.is_some(), |ui| state.patients.show(ui))
                        .inner
                })
                .inner;
            state.handle_patient_action(action);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| state.central_view(ui));
        });

        if let Some(editor) = state.report.as_mut() {
            let action = editor.show(ctx);
            if enabled {
                state.handle_editor_action(action);
            }
        }

        state.about_window(ctx);

        let outcome = state.dialogs.show(ctx);
        state.handle_dialog_outcome(outcome);
    }
}
