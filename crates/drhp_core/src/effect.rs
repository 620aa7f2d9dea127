use std::path::PathBuf;

use crate::{BlobId, CompanyId, SessionId};

/// Side effects requested by `update`; executed by the platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Read a local file into the blob store for the left-hand preview.
    LoadPreview { path: PathBuf },
    /// Drop a blob that is no longer referenced by any pane.
    ReleaseBlob { blob: BlobId },
    StartUpload { session: SessionId, path: PathBuf },
    StartRegenerate { session: SessionId, company_id: CompanyId },
    RenderPdf {
        session: SessionId,
        markdown: String,
        company_name: String,
    },
    FetchCompanies,
    FetchCompanyReport {
        session: SessionId,
        company_id: CompanyId,
        company_name: String,
    },
    LocateSourceDocument { company_id: CompanyId },
    DeleteCompany { company_id: CompanyId },
    SaveReport { blob: BlobId, filename: String },
    /// `content_type` is the declared image type that passed validation.
    UploadLogo {
        path: PathBuf,
        content_type: String,
        kind: LogoKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoKind {
    Company,
    Entity,
}

impl LogoKind {
    pub fn label(self) -> &'static str {
        match self {
            LogoKind::Company => "company",
            LogoKind::Entity => "entity",
        }
    }
}
