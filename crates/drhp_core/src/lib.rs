//! DRHP notes core: pure state machine and view-model helpers.
mod effect;
mod filename;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, LogoKind};
pub use filename::{company_report_filename, source_report_filename};
pub use msg::{DialogKind, Msg, ReportSlot};
pub use state::{
    AppState, BlobId, Company, CompanyDetail, CompanyId, Dialogs, LeftPane, LocalFile,
    ProcessingPhase, ProcessingStatus, Readiness, Report, ReportLabel, ReportPane, SessionId,
    SourceDocument, PDF_MIME,
};
pub use update::update;
pub use view_model::{
    ActiveDialog, AppViewModel, CompanyDetailView, CompanyRowView, LeftPaneView, ReportPaneView,
};
