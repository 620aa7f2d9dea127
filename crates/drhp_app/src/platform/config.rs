//! Optional `./drhp_app.ron` settings file.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use drhp_client::{ApiSettings, ReportSourceKind, SourceDocumentTable, DEFAULT_BASE_URL};
use drhp_logging::{drhp_info, drhp_warn};
use serde::Deserialize;
use url::Url;

pub(crate) const CONFIG_FILENAME: &str = "drhp_app.ron";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub stream_idle_timeout_secs: u64,
    pub report_source: ReportSourceKind,
    pub download_dir: PathBuf,
    pub static_pdf_dir: PathBuf,
    /// Company id to file name under `static_pdf_dir`.
    pub source_documents: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
            stream_idle_timeout_secs: 600,
            report_source: ReportSourceKind::default(),
            download_dir: PathBuf::from("downloads"),
            static_pdf_dir: PathBuf::from("static/pdfs"),
            source_documents: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, falling back to defaults when it is missing or unreadable.
    pub(crate) fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(Some(config)) => {
                drhp_info!("Loaded configuration from {:?}", path);
                config
            }
            Ok(None) => Self::default(),
            Err(err) => {
                drhp_warn!("Ignoring configuration {:?}: {:#}", path, err);
                Self::default()
            }
        }
    }

    fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        let config = ron::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(config))
    }

    pub(crate) fn api_settings(&self) -> anyhow::Result<ApiSettings> {
        let base_url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        let mut settings = ApiSettings::new(base_url);
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs.max(1));
        settings.stream_idle_timeout = Duration::from_secs(self.stream_idle_timeout_secs.max(1));
        settings.report_source = self.report_source;
        Ok(settings)
    }

    pub(crate) fn source_documents(&self) -> SourceDocumentTable {
        SourceDocumentTable::new(self.static_pdf_dir.clone(), self.source_documents.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use drhp_client::ReportSourceKind;
    use pretty_assertions::assert_eq;

    use super::AppConfig;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("drhp_app.ron"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drhp_app.ron");
        fs::write(
            &path,
            r#"(
                base_url: "http://backend:9000/api",
                stream_idle_timeout_secs: 30,
                report_source: Pdf,
                source_documents: { "65a1": "acme_drhp.pdf" },
            )"#,
        )
        .unwrap();

        let config = AppConfig::load_or_default(&path);
        assert_eq!(config.base_url, "http://backend:9000/api");
        assert_eq!(config.report_source, ReportSourceKind::Pdf);
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(
            config.source_documents.get("65a1").map(String::as_str),
            Some("acme_drhp.pdf")
        );

        let settings = config.api_settings().unwrap();
        assert_eq!(settings.stream_idle_timeout, Duration::from_secs(30));
        assert_eq!(settings.request_timeout, Duration::from_secs(120));
        assert_eq!(settings.base_url.as_str(), "http://backend:9000/api");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drhp_app.ron");
        fs::write(&path, "(base_url: 42").unwrap();
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let config = AppConfig {
            base_url: "not a url".to_string(),
            ..AppConfig::default()
        };
        assert!(config.api_settings().is_err());
    }
}
