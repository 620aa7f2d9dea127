use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use bytes::Bytes;
use drhp_logging::{drhp_debug, drhp_info, drhp_warn};

use crate::backend::{Backend, ProgressSink};
use crate::blob::BlobStore;
use crate::persist::AtomicFileWriter;
use crate::{BlobId, ClientError, ClientEvent, FailureKind, LogoSlot, SessionId, StatusUpdate};

const PDF_MIME: &str = "application/pdf";

/// Work the UI thread hands to the background runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    LoadFile {
        path: PathBuf,
    },
    ListCompanies,
    Upload {
        session: SessionId,
        path: PathBuf,
    },
    Regenerate {
        session: SessionId,
        company_id: String,
    },
    RenderPdf {
        session: SessionId,
        markdown: String,
        company_name: String,
    },
    FetchReport {
        session: SessionId,
        company_id: String,
        company_name: String,
    },
    DeleteCompany {
        company_id: String,
    },
    SaveBlob {
        blob: BlobId,
        filename: String,
    },
    UploadLogo {
        path: PathBuf,
        content_type: String,
        slot: LogoSlot,
    },
}

struct ChannelProgressSink {
    session: SessionId,
    tx: mpsc::Sender<ClientEvent>,
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, update: StatusUpdate) {
        let _ = self.tx.send(ClientEvent::StreamProgress {
            session: self.session,
            update,
        });
    }
}

struct Worker {
    backend: Arc<dyn Backend>,
    blobs: BlobStore,
    writer: AtomicFileWriter,
}

/// Owns the background runtime. Commands run concurrently; results are polled with [`ClientHandle::try_recv`].
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    event_rx: mpsc::Receiver<ClientEvent>,
}

impl ClientHandle {
    pub fn new(
        backend: Arc<dyn Backend>,
        blobs: BlobStore,
        download_dir: PathBuf,
    ) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ClientCommand>();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let worker = Arc::new(Worker {
            backend,
            blobs,
            writer: AtomicFileWriter::new(download_dir),
        });

        thread::Builder::new()
            .name("drhp-client".into())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let worker = worker.clone();
                    let event_tx = event_tx.clone();
                    runtime.spawn(async move {
                        worker.handle(command, event_tx).await;
                    });
                }
                drhp_debug!("Client command channel closed");
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn send(&self, command: ClientCommand) {
        if self.cmd_tx.send(command).is_err() {
            drhp_warn!("Client runtime is gone; command dropped");
        }
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl Worker {
    async fn handle(&self, command: ClientCommand, event_tx: mpsc::Sender<ClientEvent>) {
        let event = match command {
            ClientCommand::LoadFile { path } => {
                let result = self.load_file(&path).await;
                ClientEvent::FileLoaded { path, result }
            }
            ClientCommand::ListCompanies => {
                ClientEvent::CompaniesListed(self.backend.list_companies().await)
            }
            ClientCommand::Upload { session, path } => {
                let sink = ChannelProgressSink {
                    session,
                    tx: event_tx.clone(),
                };
                let result = self.backend.upload_drhp(&path, &sink).await;
                ClientEvent::StreamFinished { session, result }
            }
            ClientCommand::Regenerate {
                session,
                company_id,
            } => {
                let sink = ChannelProgressSink {
                    session,
                    tx: event_tx.clone(),
                };
                let result = self.backend.regenerate(&company_id, &sink).await;
                ClientEvent::StreamFinished { session, result }
            }
            ClientCommand::RenderPdf {
                session,
                markdown,
                company_name,
            } => {
                let result = self
                    .backend
                    .render_pdf(&markdown, &company_name)
                    .await
                    .map(|pdf| self.store_pdf(pdf));
                ClientEvent::PdfRendered { session, result }
            }
            ClientCommand::FetchReport {
                session,
                company_id,
                company_name,
            } => {
                let result = self
                    .backend
                    .fetch_report(&company_id, &company_name)
                    .await
                    .map(|artifact| {
                        let (blob, byte_len) = self.store_pdf(artifact.pdf);
                        (blob, byte_len, artifact.markdown)
                    });
                ClientEvent::ReportFetched { session, result }
            }
            ClientCommand::DeleteCompany { company_id } => {
                let result = self.backend.delete_company(&company_id).await;
                ClientEvent::CompanyDeleted { company_id, result }
            }
            ClientCommand::SaveBlob { blob, filename } => {
                ClientEvent::BlobSaved(self.save_blob(blob, &filename))
            }
            ClientCommand::UploadLogo {
                path,
                content_type,
                slot,
            } => {
                let result = self.backend.upload_logo(&path, &content_type).await;
                ClientEvent::LogoUploaded { slot, result }
            }
        };
        let _ = event_tx.send(event);
    }

    async fn load_file(&self, path: &Path) -> Result<BlobId, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ClientError::new(FailureKind::Io, err.to_string()))?;
        if !bytes.starts_with(b"%PDF") {
            drhp_warn!("{:?} does not start with a PDF header", path);
        }
        let id = self.blobs.insert(Bytes::from(bytes), PDF_MIME);
        drhp_debug!("Loaded {:?} as blob {}", path, id);
        Ok(id)
    }

    fn store_pdf(&self, pdf: Bytes) -> (BlobId, u64) {
        let byte_len = pdf.len() as u64;
        (self.blobs.insert(pdf, PDF_MIME), byte_len)
    }

    fn save_blob(&self, blob: BlobId, filename: &str) -> Result<PathBuf, ClientError> {
        let data = self.blobs.get(blob).ok_or_else(|| {
            ClientError::new(FailureKind::MissingBlob, format!("blob {blob} was released"))
        })?;
        let path = self
            .writer
            .write(filename, &data.bytes)
            .map_err(|err| ClientError::new(FailureKind::Io, err.to_string()))?;
        drhp_info!("Saved {} bytes to {:?}", data.bytes.len(), path);
        Ok(path)
    }
}
