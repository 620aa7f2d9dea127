use std::path::PathBuf;

use crate::{BlobId, Company, CompanyId, LogoKind, ProcessingStatus, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A file was dropped (pasted path) or picked; `declared_type` comes from its extension.
    FileOffered {
        path: PathBuf,
        declared_type: Option<String>,
    },
    /// The preview bytes for `path` are now held in the blob store.
    PreviewLoaded { path: PathBuf, blob: BlobId },
    /// Reading the offered file failed.
    PreviewFailed { path: PathBuf, message: String },
    /// User asked to generate IPO notes for the previewed file.
    GenerateClicked,
    /// User asked to remove the previewed file.
    RemoveClicked,
    /// User confirmed the given dialog.
    DialogConfirmed(DialogKind),
    /// User cancelled or dismissed the given dialog.
    DialogDismissed(DialogKind),
    /// User abandoned the active session of a slot. The transport keeps running.
    CancelProcessingClicked(ReportSlot),
    /// Non-terminal status record from a streaming session.
    StreamProgress {
        session: SessionId,
        status: ProcessingStatus,
    },
    /// Terminal success record carrying the generated markdown.
    StreamCompleted { session: SessionId, markdown: String },
    /// Terminal failure record, or a transport error while streaming.
    StreamFailed { session: SessionId, message: String },
    /// The stream closed or went idle without a terminal record.
    StreamInterrupted { session: SessionId, timed_out: bool },
    /// The backend rendered markdown into a PDF now held in the blob store.
    ReportRendered {
        session: SessionId,
        blob: BlobId,
        byte_len: u64,
    },
    ReportRenderFailed { session: SessionId, message: String },
    /// Refresh the company directory.
    CompaniesRequested,
    CompaniesLoaded(Vec<Company>),
    CompaniesFailed(String),
    /// User picked a company from the directory.
    CompanySelected(CompanyId),
    CompanyReportLoaded {
        session: SessionId,
        blob: BlobId,
        byte_len: u64,
        markdown: Option<String>,
    },
    CompanyReportFailed { session: SessionId, message: String },
    /// Result of looking up the static source PDF for a company.
    SourceDocumentResolved {
        company_id: CompanyId,
        path: Option<PathBuf>,
    },
    CloseCompanyDetail,
    RegenerateClicked,
    DeleteClicked(CompanyId),
    CompanyDeleted(CompanyId),
    CompanyDeleteFailed { company_id: CompanyId, message: String },
    DownloadClicked(ReportSlot),
    ReportSaved { path: PathBuf },
    ReportSaveFailed(String),
    LogoOffered {
        path: PathBuf,
        declared_type: Option<String>,
        kind: LogoKind,
    },
    LogoUploaded {
        kind: LogoKind,
        logo_id: String,
        filename: String,
    },
    LogoUploadFailed(String),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Generate,
    Remove,
    Delete,
    Warning,
}

/// The two independent report viewer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSlot {
    /// Report generated from the uploaded file.
    Generated,
    /// Report of the company opened from the directory.
    Company,
}
