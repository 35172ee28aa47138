// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Patient records and their documents.
//!
//! A patient is a directory, a document is a file inside it. These types
//! carry what the side panel needs to list, filter and order them.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extensions treated as images.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];
/// Extensions treated as PDFs.
pub const PDF_EXTENSIONS: [&str; 1] = ["pdf"];
/// File name prefix of generated reports.
pub const REPORT_PREFIX: &str = "Report_";

/// A patient folder. The folder name is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse category of a document, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
    Report,
    Other,
}

impl DocumentKind {
    /// Classify a file name. The PDF check wins over the report prefix, so
    /// generated reports show up as PDFs.
    pub fn classify(name: &str) -> Self {
        let ext = extension_of(name);
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            DocumentKind::Image
        } else if PDF_EXTENSIONS.contains(&ext.as_str()) {
            DocumentKind::Pdf
        } else if name.starts_with(REPORT_PREFIX) {
            DocumentKind::Report
        } else {
            DocumentKind::Other
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            DocumentKind::Image => "🖼",
            DocumentKind::Pdf => "📕",
            DocumentKind::Report => "📝",
            DocumentKind::Other => "📄",
        }
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// A file inside a patient folder.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        DocumentKind::classify(&self.name)
    }

    /// Local modification time as shown in the timeline.
    pub fn modified_label(&self) -> String {
        DateTime::<Local>::from(self.modified)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    /// Timeline row: icon, name and modification time.
    pub fn timeline_label(&self) -> String {
        format!("{} {}   ({})", self.kind().icon(), self.name, self.modified_label())
    }
}

/// Category filter of the document list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFilter {
    #[default]
    All,
    Images,
    Pdfs,
    Reports,
    Other,
}

impl DocumentFilter {
    pub fn all() -> &'static [DocumentFilter] {
        &[
            DocumentFilter::All,
            DocumentFilter::Images,
            DocumentFilter::Pdfs,
            DocumentFilter::Reports,
            DocumentFilter::Other,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentFilter::All => "All",
            DocumentFilter::Images => "Images",
            DocumentFilter::Pdfs => "PDFs",
            DocumentFilter::Reports => "Reports",
            DocumentFilter::Other => "Other",
        }
    }

    pub fn matches(self, name: &str) -> bool {
        let ext = extension_of(name);
        let is_image = IMAGE_EXTENSIONS.contains(&ext.as_str());
        let is_pdf = PDF_EXTENSIONS.contains(&ext.as_str());
        match self {
            DocumentFilter::All => true,
            DocumentFilter::Images => is_image,
            DocumentFilter::Pdfs => is_pdf,
            DocumentFilter::Reports => {
                name.starts_with(REPORT_PREFIX) || name.to_lowercase().contains("report")
            }
            DocumentFilter::Other => !is_image && !is_pdf,
        }
    }
}

/// Case-insensitive substring match; an empty query matches everything.
pub fn matches_query(name: &str, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || name.to_lowercase().contains(&query)
}

/// Documents passing both the text query and the category filter, in
/// their original order.
pub fn filter_documents<'a>(
    documents: &'a [Document],
    query: &str,
    filter: DocumentFilter,
) -> Vec<&'a Document> {
    documents
        .iter()
        .filter(|d| matches_query(&d.name, query) && filter.matches(&d.name))
        .collect()
}

/// Documents ordered newest first by modification time.
pub fn timeline(documents: &[Document]) -> Vec<&Document> {
    let mut ordered: Vec<&Document> = documents.iter().collect();
    ordered.sort_by(|a, b| b.modified.cmp(&a.modified));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn doc(name: &str, secs: u64) -> Document {
        Document {
            name: name.to_string(),
            path: PathBuf::from(name),
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(DocumentKind::classify("fundus.JPG"), DocumentKind::Image);
        assert_eq!(DocumentKind::classify("scan.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::classify("Report_20250101_120000.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::classify("Report_notes.txt"), DocumentKind::Report);
        assert_eq!(DocumentKind::classify("oct.dcm"), DocumentKind::Other);
        assert_eq!(DocumentKind::classify("README"), DocumentKind::Other);
    }

    #[test]
    fn test_filters() {
        assert!(DocumentFilter::All.matches("anything.xyz"));
        assert!(DocumentFilter::Images.matches("a.gif"));
        assert!(!DocumentFilter::Images.matches("a.pdf"));
        assert!(DocumentFilter::Pdfs.matches("b.PDF"));
        assert!(DocumentFilter::Reports.matches("Report_1.pdf"));
        assert!(DocumentFilter::Reports.matches("annual-REPORT.docx"));
        assert!(!DocumentFilter::Reports.matches("scan.png"));
        assert!(DocumentFilter::Other.matches("volume.nii.gz"));
        assert!(!DocumentFilter::Other.matches("Report_1.pdf"));
    }

    #[test]
    fn test_filter_documents_combines_query_and_category() {
        let docs = vec![
            doc("left_eye.png", 1),
            doc("right_eye.png", 2),
            doc("left_eye.pdf", 3),
            doc("notes.txt", 4),
        ];
        let names = |v: Vec<&Document>| v.into_iter().map(|d| d.name.clone()).collect::<Vec<_>>();

        assert_eq!(names(filter_documents(&docs, "LEFT", DocumentFilter::All)), ["left_eye.png", "left_eye.pdf"]);
        assert_eq!(names(filter_documents(&docs, "left", DocumentFilter::Images)), ["left_eye.png"]);
        assert_eq!(names(filter_documents(&docs, "", DocumentFilter::Other)), ["notes.txt"]);
        assert_eq!(filter_documents(&docs, "  ", DocumentFilter::All).len(), 4);
    }

    #[test]
    fn test_timeline_is_newest_first() {
        let docs = vec![doc("a", 10), doc("b", 30), doc("c", 20)];
        let order: Vec<&str> = timeline(&docs).iter().map(|d| d.name.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }

    #[test]
    fn test_timeline_label_has_icon_and_name() {
        let label = doc("Report_x.pdf", 0).timeline_label();
        assert!(label.starts_with("📕 Report_x.pdf"));
        assert!(label.ends_with(')'));
    }
}
