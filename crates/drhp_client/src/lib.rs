//! DRHP notes client: backend HTTP calls, status streams and local blob handling.
mod backend;
mod blob;
mod handle;
mod persist;
mod schema;
mod source_docs;
mod sse;
mod types;

pub use backend::{ApiSettings, Backend, ProgressSink, ReqwestBackend, DEFAULT_BASE_URL};
pub use blob::{Blob, BlobStore};
pub use handle::{ClientCommand, ClientHandle};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use schema::{
    CompanyRecord, MarkdownFlagAdapter, Readiness, ReadinessAdapter, ReportSourceKind,
    StatusEnumAdapter,
};
pub use source_docs::SourceDocumentTable;
pub use sse::{classify_record, EventStreamDecoder, StreamEvent};
pub use types::{
    BlobId, ClientError, ClientEvent, FailureKind, LogoAsset, LogoSlot, ReportArtifact,
    SessionId, StatusUpdate, StreamOutcome,
};
