use std::path::PathBuf;

use crate::{
    AppState, CompanyDetail, CompanyId, LeftPane, ProcessingPhase, Readiness, ReportPane,
    SourceDocument,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub left: LeftPaneView,
    pub generated: ReportPaneView,
    pub company: Option<CompanyDetailView>,
    pub companies: Vec<CompanyRowView>,
    pub directory_loading: bool,
    pub dialog: Option<ActiveDialog>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LeftPaneView {
    #[default]
    Empty,
    Loading { file_name: String },
    Previewing { file_name: String, path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportPaneView {
    #[default]
    Idle,
    Processing {
        headline: String,
        step: Option<String>,
        progress: Option<u8>,
    },
    Ready {
        filename: String,
        byte_len: u64,
        markdown: Option<String>,
    },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRowView {
    pub id: CompanyId,
    pub name: String,
    pub corporate_identity_number: String,
    pub created_at: String,
    pub status: &'static str,
    pub selectable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyDetailView {
    pub id: CompanyId,
    pub name: String,
    pub corporate_identity_number: String,
    pub website_link: Option<String>,
    pub created_at: String,
    pub status: &'static str,
    pub report: ReportPaneView,
    pub source_document: SourceDocument,
}

/// The dialog to draw on top; warnings win over confirmations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveDialog {
    Warning(String),
    Generate,
    Remove,
    Delete { company_name: String },
}

impl AppViewModel {
    pub(crate) fn build(state: &AppState) -> Self {
        let companies = state
            .directory
            .companies
            .iter()
            .map(|company| CompanyRowView {
                id: company.id.clone(),
                name: company.name.clone(),
                corporate_identity_number: company.corporate_identity_number.clone(),
                created_at: company.created_at.clone(),
                status: company.readiness.label(),
                selectable: company.readiness == Readiness::Ready,
            })
            .collect();

        Self {
            left: left_view(&state.left),
            generated: report_view(&state.generated),
            company: state.company.as_ref().map(detail_view),
            companies,
            directory_loading: state.directory.loading,
            dialog: active_dialog(state),
            notice: state.notice.clone(),
        }
    }
}

fn left_view(left: &LeftPane) -> LeftPaneView {
    match left {
        LeftPane::Empty => LeftPaneView::Empty,
        LeftPane::Loading { file } => LeftPaneView::Loading {
            file_name: file.name.clone(),
        },
        LeftPane::Previewing { file, .. } => LeftPaneView::Previewing {
            file_name: file.name.clone(),
            path: file.path.clone(),
        },
    }
}

fn report_view(pane: &ReportPane) -> ReportPaneView {
    match pane {
        ReportPane::Idle => ReportPaneView::Idle,
        ReportPane::Processing { status, phase, .. } => {
            let (headline, step, progress) = match (phase, status) {
                (ProcessingPhase::Fetching, _) => ("Loading report...".to_string(), None, None),
                (ProcessingPhase::RenderingPdf { .. }, _) => {
                    ("Generating PDF report...".to_string(), None, Some(100))
                }
                (ProcessingPhase::Streaming, Some(status)) => (
                    status.message.clone(),
                    status.step.clone(),
                    status.progress,
                ),
                (ProcessingPhase::Streaming, None) => {
                    ("Generating IPO notes...".to_string(), None, None)
                }
            };
            ReportPaneView::Processing {
                headline,
                step,
                progress,
            }
        }
        ReportPane::Ready { report } => ReportPaneView::Ready {
            filename: report.label.download_filename(),
            byte_len: report.byte_len,
            markdown: report.markdown.clone(),
        },
        ReportPane::Error { message } => ReportPaneView::Error {
            message: message.clone(),
        },
    }
}

fn detail_view(detail: &CompanyDetail) -> CompanyDetailView {
    let company = &detail.company;
    CompanyDetailView {
        id: company.id.clone(),
        name: company.name.clone(),
        corporate_identity_number: company.corporate_identity_number.clone(),
        website_link: company.website_link.clone(),
        created_at: company.created_at.clone(),
        status: company.readiness.label(),
        report: report_view(&detail.pane),
        source_document: detail.source_document.clone(),
    }
}

fn active_dialog(state: &AppState) -> Option<ActiveDialog> {
    let dialogs = &state.dialogs;
    if let Some(message) = &dialogs.warning {
        return Some(ActiveDialog::Warning(message.clone()));
    }
    if let Some(company_id) = &dialogs.delete_confirm {
        let company_name = state
            .directory
            .companies
            .iter()
            .find(|company| &company.id == company_id)
            .map(|company| company.name.clone())
            .unwrap_or_else(|| company_id.clone());
        return Some(ActiveDialog::Delete { company_name });
    }
    if dialogs.remove_confirm {
        return Some(ActiveDialog::Remove);
    }
    if dialogs.generate_confirm {
        return Some(ActiveDialog::Generate);
    }
    None
}
