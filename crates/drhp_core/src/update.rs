use std::path::PathBuf;

use drhp_logging::{drhp_debug, drhp_info, drhp_warn};

use crate::{
    AppState, BlobId, Company, CompanyDetail, CompanyId, DialogKind, Effect, LeftPane, LocalFile,
    LogoKind, Msg, ProcessingPhase, ProcessingStatus, Report, ReportLabel, ReportPane, ReportSlot,
    SessionId, SourceDocument, PDF_MIME,
};

const LOGO_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/svg+xml", "image/webp"];

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileOffered {
            path,
            declared_type,
        } => offer_file(&mut state, path, declared_type),
        Msg::PreviewLoaded { path, blob } => {
            let matches = matches!(&state.left, LeftPane::Loading { file } if file.path == path);
            if matches {
                let file = LocalFile::from_path(&path);
                state.left = LeftPane::Previewing { file, blob };
                state.mark_dirty();
                Vec::new()
            } else {
                drhp_debug!("Discarding stale preview for {:?}", path);
                vec![Effect::ReleaseBlob { blob }]
            }
        }
        Msg::PreviewFailed { path, message } => {
            let matches = matches!(&state.left, LeftPane::Loading { file } if file.path == path);
            if matches {
                state.left = LeftPane::Empty;
                state.warn(format!("Could not read {}: {message}", path.display()));
            }
            Vec::new()
        }
        Msg::GenerateClicked => {
            if !matches!(state.left, LeftPane::Previewing { .. }) {
                state.warn("Please upload a DRHP PDF file first.");
            } else if !state.generated.is_processing() {
                state.dialogs.generate_confirm = true;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RemoveClicked => {
            if state.left != LeftPane::Empty {
                state.dialogs.remove_confirm = true;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DialogConfirmed(kind) => confirm_dialog(&mut state, kind),
        Msg::DialogDismissed(kind) => {
            close_dialog(&mut state, kind);
            Vec::new()
        }
        Msg::CancelProcessingClicked(slot) => {
            let pane = match slot {
                ReportSlot::Generated => Some(&mut state.generated),
                ReportSlot::Company => state.company.as_mut().map(|detail| &mut detail.pane),
            };
            if let Some(pane) = pane.filter(|pane| pane.is_processing()) {
                drhp_info!("Abandoning session {:?} on {:?} slot", pane.session(), slot);
                pane.replace(ReportPane::Idle);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StreamProgress { session, status } => {
            apply_progress(&mut state, session, status);
            Vec::new()
        }
        Msg::StreamCompleted { session, markdown } => complete_stream(&mut state, session, markdown),
        Msg::StreamFailed { session, message } => {
            let message = if message.trim().is_empty() {
                "Processing failed.".to_string()
            } else {
                message
            };
            fail_session(&mut state, session, message);
            Vec::new()
        }
        Msg::StreamInterrupted { session, timed_out } => {
            let message = if timed_out {
                "Processing timed out."
            } else {
                "Processing stream ended before completion."
            };
            fail_session(&mut state, session, message.to_string());
            Vec::new()
        }
        Msg::ReportRendered {
            session,
            blob,
            byte_len,
        } => finish_render(&mut state, session, blob, byte_len),
        Msg::ReportRenderFailed { session, message } => {
            fail_session(
                &mut state,
                session,
                format!("Failed to generate PDF report: {message}"),
            );
            Vec::new()
        }
        Msg::CompaniesRequested => request_companies(&mut state),
        Msg::CompaniesLoaded(companies) => {
            load_companies(&mut state, companies);
            Vec::new()
        }
        Msg::CompaniesFailed(message) => {
            state.directory.loading = false;
            state.warn(format!("Failed to load companies: {message}"));
            Vec::new()
        }
        Msg::CompanySelected(company_id) => select_company(&mut state, &company_id),
        Msg::CompanyReportLoaded {
            session,
            blob,
            byte_len,
            markdown,
        } => {
            let Some(pane) = state.pane_for_session(session) else {
                drhp_debug!("Ignoring report for inactive session {}", session);
                return (state, vec![Effect::ReleaseBlob { blob }]);
            };
            let ReportPane::Processing {
                label,
                phase: ProcessingPhase::Fetching,
                ..
            } = pane
            else {
                return (state, vec![Effect::ReleaseBlob { blob }]);
            };
            let report = Report {
                blob,
                label: label.clone(),
                byte_len,
                markdown,
            };
            pane.replace(ReportPane::Ready { report });
            state.mark_dirty();
            Vec::new()
        }
        Msg::CompanyReportFailed { session, message } => {
            fail_session(
                &mut state,
                session,
                format!("Failed to load company report: {message}"),
            );
            Vec::new()
        }
        Msg::SourceDocumentResolved { company_id, path } => {
            if let Some(detail) = state
                .company
                .as_mut()
                .filter(|detail| detail.company.id == company_id)
            {
                detail.source_document = match path {
                    Some(path) => SourceDocument::Found(path),
                    None => SourceDocument::NotFound,
                };
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CloseCompanyDetail => close_company_detail(&mut state),
        Msg::RegenerateClicked => regenerate(&mut state),
        Msg::DeleteClicked(company_id) => {
            if state
                .directory
                .companies
                .iter()
                .any(|company| company.id == company_id)
            {
                state.dialogs.delete_confirm = Some(company_id);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CompanyDeleted(company_id) => remove_company(&mut state, &company_id),
        Msg::CompanyDeleteFailed {
            company_id,
            message,
        } => {
            drhp_warn!("Delete of company {} failed: {}", company_id, message);
            state.warn(format!("Failed to delete company: {message}"));
            Vec::new()
        }
        Msg::DownloadClicked(slot) => download(&mut state, slot),
        Msg::ReportSaved { path } => {
            state.set_notice(format!("Saved report to {}", path.display()));
            Vec::new()
        }
        Msg::ReportSaveFailed(message) => {
            state.warn(format!("Failed to download PDF report: {message}"));
            Vec::new()
        }
        Msg::LogoOffered {
            path,
            declared_type,
            kind,
        } => offer_logo(&mut state, path, declared_type, kind),
        Msg::LogoUploaded {
            kind,
            logo_id,
            filename,
        } => {
            state.set_notice(format!(
                "Uploaded {} logo {filename} (id {logo_id})",
                kind.label()
            ));
            Vec::new()
        }
        Msg::LogoUploadFailed(message) => {
            state.warn(format!("Failed to upload logo: {message}"));
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn offer_file(state: &mut AppState, path: PathBuf, declared_type: Option<String>) -> Vec<Effect> {
    if !declared_type
        .as_deref()
        .is_some_and(|mime| mime.eq_ignore_ascii_case(PDF_MIME))
    {
        drhp_info!("Rejected {:?} with declared type {:?}", path, declared_type);
        state.warn("Please upload a PDF file only.");
        return Vec::new();
    }

    let file = LocalFile::from_path(&path);
    let mut effects = Vec::with_capacity(2);
    if let Some(blob) = state.take_preview(LeftPane::Loading { file }) {
        effects.push(Effect::ReleaseBlob { blob });
    }
    effects.push(Effect::LoadPreview { path });
    state.mark_dirty();
    effects
}

fn offer_logo(
    state: &mut AppState,
    path: PathBuf,
    declared_type: Option<String>,
    kind: LogoKind,
) -> Vec<Effect> {
    let accepted = declared_type.filter(|mime| {
        LOGO_MIME_TYPES
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime))
    });
    let Some(content_type) = accepted else {
        state.warn("Please choose a PNG, JPEG, SVG or WebP image for the logo.");
        return Vec::new();
    };
    state.set_notice(format!("Uploading {} logo...", kind.label()));
    vec![Effect::UploadLogo {
        path,
        content_type,
        kind,
    }]
}

fn confirm_dialog(state: &mut AppState, kind: DialogKind) -> Vec<Effect> {
    match kind {
        DialogKind::Generate => {
            if !state.dialogs.generate_confirm {
                return Vec::new();
            }
            state.dialogs.generate_confirm = false;
            state.mark_dirty();
            start_upload(state)
        }
        DialogKind::Remove => {
            if !state.dialogs.remove_confirm {
                return Vec::new();
            }
            state.dialogs.remove_confirm = false;
            remove_file(state)
        }
        DialogKind::Delete => match state.dialogs.delete_confirm.take() {
            Some(company_id) => {
                state.mark_dirty();
                vec![Effect::DeleteCompany { company_id }]
            }
            None => Vec::new(),
        },
        DialogKind::Warning => {
            close_dialog(state, DialogKind::Warning);
            Vec::new()
        }
    }
}

fn close_dialog(state: &mut AppState, kind: DialogKind) {
    let dialogs = &mut state.dialogs;
    let was_open = match kind {
        DialogKind::Generate => std::mem::take(&mut dialogs.generate_confirm),
        DialogKind::Remove => std::mem::take(&mut dialogs.remove_confirm),
        DialogKind::Delete => dialogs.delete_confirm.take().is_some(),
        DialogKind::Warning => dialogs.warning.take().is_some(),
    };
    if was_open {
        state.mark_dirty();
    }
}

fn start_upload(state: &mut AppState) -> Vec<Effect> {
    let LeftPane::Previewing { file, .. } = &state.left else {
        return Vec::new();
    };
    if state.generated.is_processing() {
        return Vec::new();
    }
    let label = ReportLabel::SourceFile {
        name: file.name.clone(),
    };
    let path = file.path.clone();
    let session = state.next_session();
    let released = state.generated.replace(ReportPane::Processing {
        session,
        label,
        status: None,
        phase: ProcessingPhase::Streaming,
    });
    state.notice = None;
    drhp_info!("Starting upload session {} for {:?}", session, path);

    let mut effects: Vec<Effect> = released
        .map(|blob| Effect::ReleaseBlob { blob })
        .into_iter()
        .collect();
    effects.push(Effect::StartUpload { session, path });
    effects
}

fn remove_file(state: &mut AppState) -> Vec<Effect> {
    let mut released = Vec::new();
    released.extend(state.take_preview(LeftPane::Empty));
    released.extend(state.generated.replace(ReportPane::Idle));
    if let Some(mut detail) = state.company.take() {
        released.extend(detail.pane.replace(ReportPane::Idle));
    }
    state.mark_dirty();
    released
        .into_iter()
        .map(|blob| Effect::ReleaseBlob { blob })
        .collect()
}

fn apply_progress(state: &mut AppState, session: SessionId, next: ProcessingStatus) {
    let Some(pane) = state.pane_for_session(session) else {
        drhp_debug!("Ignoring progress for inactive session {}", session);
        return;
    };
    if let ReportPane::Processing {
        status,
        phase: ProcessingPhase::Streaming,
        ..
    } = pane
    {
        *status = Some(next);
        state.mark_dirty();
    }
}

fn complete_stream(state: &mut AppState, session: SessionId, markdown: String) -> Vec<Effect> {
    let Some(pane) = state.pane_for_session(session) else {
        drhp_debug!("Ignoring completion for inactive session {}", session);
        return Vec::new();
    };
    let ReportPane::Processing { label, phase, .. } = pane else {
        return Vec::new();
    };
    if *phase != ProcessingPhase::Streaming {
        return Vec::new();
    }
    let company_name = label.company_name();
    *phase = ProcessingPhase::RenderingPdf {
        markdown: markdown.clone(),
    };
    state.mark_dirty();
    vec![Effect::RenderPdf {
        session,
        markdown,
        company_name,
    }]
}

fn finish_render(
    state: &mut AppState,
    session: SessionId,
    blob: BlobId,
    byte_len: u64,
) -> Vec<Effect> {
    let Some(pane) = state.pane_for_session(session) else {
        drhp_debug!("Ignoring rendered report for inactive session {}", session);
        return vec![Effect::ReleaseBlob { blob }];
    };
    let ReportPane::Processing {
        label,
        phase: ProcessingPhase::RenderingPdf { markdown },
        ..
    } = pane
    else {
        return vec![Effect::ReleaseBlob { blob }];
    };
    let report = Report {
        blob,
        label: label.clone(),
        byte_len,
        markdown: Some(std::mem::take(markdown)),
    };
    pane.replace(ReportPane::Ready { report });
    state.mark_dirty();
    request_companies(state)
}

fn fail_session(state: &mut AppState, session: SessionId, message: String) {
    let Some(pane) = state.pane_for_session(session) else {
        drhp_debug!("Ignoring failure for inactive session {}: {}", session, message);
        return;
    };
    drhp_warn!("Session {} failed: {}", session, message);
    pane.replace(ReportPane::Error {
        message: message.clone(),
    });
    state.warn(message);
}

fn request_companies(state: &mut AppState) -> Vec<Effect> {
    state.directory.loading = true;
    state.mark_dirty();
    vec![Effect::FetchCompanies]
}

fn load_companies(state: &mut AppState, companies: Vec<Company>) {
    if let Some(detail) = state.company.as_mut() {
        if let Some(fresh) = companies.iter().find(|c| c.id == detail.company.id) {
            detail.company = fresh.clone();
        }
    }
    state.directory.companies = companies;
    state.directory.loading = false;
    state.mark_dirty();
}

fn select_company(state: &mut AppState, company_id: &str) -> Vec<Effect> {
    let Some(company) = state
        .directory
        .companies
        .iter()
        .find(|company| company.id == company_id)
        .filter(|company| company.is_ready())
        .cloned()
    else {
        return Vec::new();
    };

    let session = state.next_session();
    let label = ReportLabel::Company {
        name: company.name.clone(),
    };
    let detail = CompanyDetail {
        company: company.clone(),
        pane: ReportPane::Processing {
            session,
            label,
            status: None,
            phase: ProcessingPhase::Fetching,
        },
        source_document: SourceDocument::Unresolved,
    };

    let mut effects = Vec::with_capacity(3);
    if let Some(mut previous) = state.company.replace(detail) {
        if let Some(blob) = previous.pane.replace(ReportPane::Idle) {
            effects.push(Effect::ReleaseBlob { blob });
        }
    }
    state.mark_dirty();
    effects.push(Effect::FetchCompanyReport {
        session,
        company_id: company.id.clone(),
        company_name: company.name,
    });
    effects.push(Effect::LocateSourceDocument {
        company_id: company.id,
    });
    effects
}

fn close_company_detail(state: &mut AppState) -> Vec<Effect> {
    let Some(mut detail) = state.company.take() else {
        return Vec::new();
    };
    state.mark_dirty();
    detail
        .pane
        .replace(ReportPane::Idle)
        .map(|blob| Effect::ReleaseBlob { blob })
        .into_iter()
        .collect()
}

fn regenerate(state: &mut AppState) -> Vec<Effect> {
    let Some(detail) = state.company.as_ref() else {
        return Vec::new();
    };
    if detail.pane.is_processing() {
        return Vec::new();
    }
    let company_id = detail.company.id.clone();
    let label = ReportLabel::Company {
        name: detail.company.name.clone(),
    };
    let session = state.next_session();
    let released = state.company.as_mut().and_then(|detail| {
        detail.pane.replace(ReportPane::Processing {
            session,
            label,
            status: None,
            phase: ProcessingPhase::Streaming,
        })
    });
    state.mark_dirty();
    drhp_info!("Starting regenerate session {} for company {}", session, company_id);

    let mut effects: Vec<Effect> = released
        .map(|blob| Effect::ReleaseBlob { blob })
        .into_iter()
        .collect();
    effects.push(Effect::StartRegenerate {
        session,
        company_id,
    });
    effects
}

fn remove_company(state: &mut AppState, company_id: &CompanyId) -> Vec<Effect> {
    let before = state.directory.companies.len();
    state
        .directory
        .companies
        .retain(|company| &company.id != company_id);
    let mut effects = Vec::new();
    let detail_open = state
        .company
        .as_ref()
        .is_some_and(|detail| &detail.company.id == company_id);
    if detail_open {
        effects = close_company_detail(state);
    }
    if before != state.directory.companies.len() || detail_open {
        state.mark_dirty();
    }
    effects
}

fn download(state: &mut AppState, slot: ReportSlot) -> Vec<Effect> {
    let pane = match slot {
        ReportSlot::Generated => Some(&state.generated),
        ReportSlot::Company => state.company.as_ref().map(|detail| &detail.pane),
    };
    let target = match pane {
        Some(ReportPane::Ready { report }) => {
            Some((report.blob, report.label.download_filename()))
        }
        _ => None,
    };
    match target {
        Some((blob, filename)) => vec![Effect::SaveReport { blob, filename }],
        None => {
            state.warn("No IPO notes PDF generated yet.");
            Vec::new()
        }
    }
}
