use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use crate::CompanyRecord;

pub type SessionId = u64;
pub type BlobId = u64;

/// One non-terminal status record from a processing stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub step: Option<String>,
    pub message: String,
    pub status: String,
    pub progress: Option<u8>,
}

/// How a processing stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed { markdown: String },
    Failed { message: String },
    /// Transport closed without a terminal record.
    Ended,
    /// No bytes arrived within the idle timeout.
    TimedOut,
}

/// A stored report: the PDF bytes plus the markdown source when the backend supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub pdf: Bytes,
    pub markdown: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogoAsset {
    pub filename: String,
    pub logo_id: String,
}

/// Which logo button started an upload; the backend endpoint is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoSlot {
    Company,
    Entity,
}

/// Results reported back from the background runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    FileLoaded {
        path: PathBuf,
        result: Result<BlobId, ClientError>,
    },
    StreamProgress {
        session: SessionId,
        update: StatusUpdate,
    },
    StreamFinished {
        session: SessionId,
        result: Result<StreamOutcome, ClientError>,
    },
    PdfRendered {
        session: SessionId,
        result: Result<(BlobId, u64), ClientError>,
    },
    CompaniesListed(Result<Vec<CompanyRecord>, ClientError>),
    ReportFetched {
        session: SessionId,
        result: Result<(BlobId, u64, Option<String>), ClientError>,
    },
    CompanyDeleted {
        company_id: String,
        result: Result<(), ClientError>,
    },
    BlobSaved(Result<PathBuf, ClientError>),
    LogoUploaded {
        slot: LogoSlot,
        result: Result<LogoAsset, ClientError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    Io,
    /// A blob referenced by a command is no longer in the store.
    MissingBlob,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::MissingBlob => write!(f, "missing report data"),
        }
    }
}
