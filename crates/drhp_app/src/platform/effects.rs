use std::path::{Path, PathBuf};
use std::sync::Arc;

use drhp_client::{
    BlobStore, ClientCommand, ClientError, ClientEvent, ClientHandle, CompanyRecord, FailureKind,
    LogoSlot, ReqwestBackend, SourceDocumentTable, StreamOutcome,
};
use drhp_core::{Company, Effect, LogoKind, Msg, ProcessingStatus, Readiness};
use drhp_logging::{drhp_debug, drhp_info, drhp_warn};

use super::config::AppConfig;

/// Executes core effects against the background client and the local blob store.
pub struct EffectRunner {
    client: ClientHandle,
    blobs: BlobStore,
    source_documents: SourceDocumentTable,
}

impl EffectRunner {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let settings = config.api_settings()?;
        drhp_info!("Backend at {}", settings.base_url);
        let backend = ReqwestBackend::new(settings)?;
        let blobs = BlobStore::new();
        let client = ClientHandle::new(
            Arc::new(backend),
            blobs.clone(),
            download_dir(&config.download_dir),
        )?;
        Ok(Self {
            client,
            blobs,
            source_documents: config.source_documents(),
        })
    }

    /// Runs `effects`. Effects answered without IO come back as messages.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut immediate = Vec::new();
        for effect in effects {
            match effect {
                Effect::ReleaseBlob { blob } => {
                    if !self.blobs.release(blob) {
                        drhp_debug!("Blob {} was already released", blob);
                    }
                }
                Effect::LocateSourceDocument { company_id } => {
                    let path = self.source_documents.locate(&company_id);
                    immediate.push(Msg::SourceDocumentResolved { company_id, path });
                }
                other => {
                    if let Some(command) = to_command(other) {
                        self.client.send(command);
                    }
                }
            }
        }
        immediate
    }

    /// Drains finished client work as messages for `update`.
    pub fn poll(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(event) = self.client.try_recv() {
            msgs.push(to_msg(event));
        }
        msgs
    }
}

fn download_dir(configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        return configured.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(configured)
}

fn to_command(effect: Effect) -> Option<ClientCommand> {
    let command = match effect {
        Effect::LoadPreview { path } => ClientCommand::LoadFile { path },
        Effect::StartUpload { session, path } => ClientCommand::Upload { session, path },
        Effect::StartRegenerate {
            session,
            company_id,
        } => ClientCommand::Regenerate {
            session,
            company_id,
        },
        Effect::RenderPdf {
            session,
            markdown,
            company_name,
        } => ClientCommand::RenderPdf {
            session,
            markdown,
            company_name,
        },
        Effect::FetchCompanies => ClientCommand::ListCompanies,
        Effect::FetchCompanyReport {
            session,
            company_id,
            company_name,
        } => ClientCommand::FetchReport {
            session,
            company_id,
            company_name,
        },
        Effect::DeleteCompany { company_id } => ClientCommand::DeleteCompany { company_id },
        Effect::SaveReport { blob, filename } => ClientCommand::SaveBlob { blob, filename },
        Effect::UploadLogo {
            path,
            content_type,
            kind,
        } => ClientCommand::UploadLogo {
            path,
            content_type,
            slot: match kind {
                LogoKind::Company => LogoSlot::Company,
                LogoKind::Entity => LogoSlot::Entity,
            },
        },
        Effect::ReleaseBlob { .. } | Effect::LocateSourceDocument { .. } => return None,
    };
    Some(command)
}

fn to_msg(event: ClientEvent) -> Msg {
    match event {
        ClientEvent::FileLoaded { path, result } => match result {
            Ok(blob) => Msg::PreviewLoaded { path, blob },
            Err(err) => Msg::PreviewFailed {
                path,
                message: describe(&err),
            },
        },
        ClientEvent::StreamProgress { session, update } => Msg::StreamProgress {
            session,
            status: ProcessingStatus {
                step: update.step,
                message: update.message,
                status: update.status,
                progress: update.progress,
            },
        },
        ClientEvent::StreamFinished { session, result } => match result {
            Ok(StreamOutcome::Completed { markdown }) => Msg::StreamCompleted { session, markdown },
            Ok(StreamOutcome::Failed { message }) => Msg::StreamFailed { session, message },
            Ok(StreamOutcome::Ended) => Msg::StreamInterrupted {
                session,
                timed_out: false,
            },
            Ok(StreamOutcome::TimedOut) => Msg::StreamInterrupted {
                session,
                timed_out: true,
            },
            Err(err) => {
                drhp_warn!("Session {} failed: {}", session, err);
                Msg::StreamFailed {
                    session,
                    message: describe(&err),
                }
            }
        },
        ClientEvent::PdfRendered { session, result } => match result {
            Ok((blob, byte_len)) => Msg::ReportRendered {
                session,
                blob,
                byte_len,
            },
            Err(err) => Msg::ReportRenderFailed {
                session,
                message: describe(&err),
            },
        },
        ClientEvent::CompaniesListed(result) => match result {
            Ok(records) => Msg::CompaniesLoaded(records.into_iter().map(to_company).collect()),
            Err(err) => Msg::CompaniesFailed(describe(&err)),
        },
        ClientEvent::ReportFetched { session, result } => match result {
            Ok((blob, byte_len, markdown)) => Msg::CompanyReportLoaded {
                session,
                blob,
                byte_len,
                markdown,
            },
            Err(err) => Msg::CompanyReportFailed {
                session,
                message: describe(&err),
            },
        },
        ClientEvent::CompanyDeleted { company_id, result } => match result {
            Ok(()) => Msg::CompanyDeleted(company_id),
            Err(err) => Msg::CompanyDeleteFailed {
                company_id,
                message: describe(&err),
            },
        },
        ClientEvent::BlobSaved(result) => match result {
            Ok(path) => Msg::ReportSaved { path },
            Err(err) => Msg::ReportSaveFailed(describe(&err)),
        },
        ClientEvent::LogoUploaded { slot, result } => match result {
            Ok(asset) => Msg::LogoUploaded {
                kind: match slot {
                    LogoSlot::Company => LogoKind::Company,
                    LogoSlot::Entity => LogoKind::Entity,
                },
                logo_id: asset.logo_id,
                filename: asset.filename,
            },
            Err(err) => Msg::LogoUploadFailed(describe(&err)),
        },
    }
}

/// Server-provided details are shown verbatim; transport failures keep their kind.
fn describe(err: &ClientError) -> String {
    match err.kind {
        FailureKind::HttpStatus(_) | FailureKind::Io => err.message.clone(),
        _ => err.to_string(),
    }
}

fn to_company(record: CompanyRecord) -> Company {
    let readiness = match record.readiness() {
        drhp_client::Readiness::Pending => Readiness::Pending,
        drhp_client::Readiness::Processing => Readiness::Processing,
        drhp_client::Readiness::Ready => Readiness::Ready,
        drhp_client::Readiness::Failed => Readiness::Failed,
    };
    Company {
        id: record.id,
        name: record.name,
        corporate_identity_number: record.corporate_identity_number,
        website_link: record.website_link,
        created_at: record.created_at,
        readiness,
    }
}
