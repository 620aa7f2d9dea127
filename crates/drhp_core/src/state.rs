use std::path::{Path, PathBuf};

use crate::filename::{company_report_filename, source_report_filename};
use crate::view_model::AppViewModel;

pub type SessionId = u64;
pub type BlobId = u64;
pub type CompanyId = String;

pub const PDF_MIME: &str = "application/pdf";

/// A user-selected file on the local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub name: String,
}

impl LocalFile {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path: path.to_path_buf(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LeftPane {
    #[default]
    Empty,
    Loading {
        file: LocalFile,
    },
    Previewing {
        file: LocalFile,
        blob: BlobId,
    },
}

impl LeftPane {
    pub fn file(&self) -> Option<&LocalFile> {
        match self {
            LeftPane::Empty => None,
            LeftPane::Loading { file } | LeftPane::Previewing { file, .. } => Some(file),
        }
    }

    fn blob(&self) -> Option<BlobId> {
        match self {
            LeftPane::Previewing { blob, .. } => Some(*blob),
            _ => None,
        }
    }
}

/// Latest progress record of a streaming session. Replaced on each update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingStatus {
    pub step: Option<String>,
    pub message: String,
    pub status: String,
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingPhase {
    /// Fetching a stored report.
    Fetching,
    /// Reading the status stream of an upload or regenerate.
    Streaming,
    /// Waiting for the backend to render the completed markdown.
    RenderingPdf { markdown: String },
}

/// What a report was produced from; drives its display and download name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLabel {
    SourceFile { name: String },
    Company { name: String },
}

impl ReportLabel {
    /// Name sent to the PDF renderer.
    pub fn company_name(&self) -> String {
        match self {
            ReportLabel::SourceFile { name } => strip_pdf_extension(name).to_string(),
            ReportLabel::Company { name } => name.clone(),
        }
    }

    pub fn download_filename(&self) -> String {
        match self {
            ReportLabel::SourceFile { name } => source_report_filename(name),
            ReportLabel::Company { name } => company_report_filename(name),
        }
    }
}

pub(crate) fn strip_pdf_extension(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".pdf") {
        &name[..len - 4]
    } else {
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub blob: BlobId,
    pub label: ReportLabel,
    pub byte_len: u64,
    pub markdown: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportPane {
    #[default]
    Idle,
    Processing {
        session: SessionId,
        label: ReportLabel,
        status: Option<ProcessingStatus>,
        phase: ProcessingPhase,
    },
    Ready {
        report: Report,
    },
    Error {
        message: String,
    },
}

impl ReportPane {
    pub fn is_processing(&self) -> bool {
        matches!(self, ReportPane::Processing { .. })
    }

    pub(crate) fn session(&self) -> Option<SessionId> {
        match self {
            ReportPane::Processing { session, .. } => Some(*session),
            _ => None,
        }
    }

    /// Replace the pane, returning the blob the previous state held, if any.
    pub(crate) fn replace(&mut self, next: ReportPane) -> Option<BlobId> {
        match std::mem::replace(self, next) {
            ReportPane::Ready { report } => Some(report.blob),
            _ => None,
        }
    }
}

/// Report readiness normalized across backend schema variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Processing,
    Ready,
    Failed,
}

impl Readiness {
    pub fn label(self) -> &'static str {
        match self {
            Readiness::Pending => "PENDING",
            Readiness::Processing => "PROCESSING",
            Readiness::Ready => "COMPLETED",
            Readiness::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub corporate_identity_number: String,
    pub website_link: Option<String>,
    pub created_at: String,
    pub readiness: Readiness,
}

impl Company {
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceDocument {
    #[default]
    Unresolved,
    Found(PathBuf),
    NotFound,
}

/// The open detail view for a directory entry, with its own report slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyDetail {
    pub company: Company,
    pub pane: ReportPane,
    pub source_document: SourceDocument,
}

/// Modal dialogs. Each one opens and closes independently of the others.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dialogs {
    pub generate_confirm: bool,
    pub remove_confirm: bool,
    pub delete_confirm: Option<CompanyId>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Directory {
    pub(crate) companies: Vec<Company>,
    pub(crate) loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) left: LeftPane,
    pub(crate) generated: ReportPane,
    pub(crate) company: Option<CompanyDetail>,
    pub(crate) directory: Directory,
    pub(crate) dialogs: Dialogs,
    pub(crate) notice: Option<String>,
    next_session: SessionId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::build(self)
    }

    pub fn left(&self) -> &LeftPane {
        &self.left
    }

    pub fn generated(&self) -> &ReportPane {
        &self.generated
    }

    pub fn company_detail(&self) -> Option<&CompanyDetail> {
        self.company.as_ref()
    }

    pub fn companies(&self) -> &[Company] {
        &self.directory.companies
    }

    pub fn dialogs(&self) -> &Dialogs {
        &self.dialogs
    }

    /// Blobs currently referenced by any pane.
    pub fn live_blobs(&self) -> Vec<BlobId> {
        let mut blobs = Vec::new();
        blobs.extend(self.left.blob());
        if let ReportPane::Ready { report } = &self.generated {
            blobs.push(report.blob);
        }
        if let Some(CompanyDetail {
            pane: ReportPane::Ready { report },
            ..
        }) = &self.company
        {
            blobs.push(report.blob);
        }
        blobs
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn next_session(&mut self) -> SessionId {
        self.next_session += 1;
        self.next_session
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.dialogs.warning = Some(message.into());
        self.mark_dirty();
    }

    pub(crate) fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
        self.mark_dirty();
    }

    /// The pane currently running `session`, if any.
    pub(crate) fn pane_for_session(&mut self, session: SessionId) -> Option<&mut ReportPane> {
        if self.generated.session() == Some(session) {
            return Some(&mut self.generated);
        }
        match self.company.as_mut() {
            Some(detail) if detail.pane.session() == Some(session) => Some(&mut detail.pane),
            _ => None,
        }
    }

    pub(crate) fn take_preview(&mut self, next: LeftPane) -> Option<BlobId> {
        std::mem::replace(&mut self.left, next).blob()
    }
}
