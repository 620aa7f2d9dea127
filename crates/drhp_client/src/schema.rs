//! Company records as served by either backend schema variant.

use serde::{Deserialize, Deserializer};

/// Report readiness, independent of which field the backend used to express it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Processing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanyRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "uin")]
    pub corporate_identity_number: String,
    #[serde(default)]
    pub website_link: Option<String>,
    #[serde(default, alias = "uploadDate")]
    pub created_at: String,
    #[serde(default, alias = "status")]
    pub processing_status: Option<String>,
    #[serde(default, alias = "hasMarkdown")]
    pub has_markdown: Option<bool>,
}

impl CompanyRecord {
    /// Readiness according to the first adapter that recognizes this record.
    pub fn readiness(&self) -> Readiness {
        let adapters: [&dyn ReadinessAdapter; 2] = [&StatusEnumAdapter, &MarkdownFlagAdapter];
        adapters
            .iter()
            .find_map(|adapter| adapter.readiness(self))
            .unwrap_or(Readiness::Pending)
    }
}

/// Maps one schema variant's readiness field onto [`Readiness`].
pub trait ReadinessAdapter {
    fn readiness(&self, record: &CompanyRecord) -> Option<Readiness>;
}

/// `processing_status: PENDING | PROCESSING | COMPLETED | FAILED`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusEnumAdapter;

impl ReadinessAdapter for StatusEnumAdapter {
    fn readiness(&self, record: &CompanyRecord) -> Option<Readiness> {
        let status = record.processing_status.as_deref()?.trim();
        let readiness = if status.eq_ignore_ascii_case("COMPLETED") {
            Readiness::Ready
        } else if status.eq_ignore_ascii_case("PROCESSING") {
            Readiness::Processing
        } else if status.eq_ignore_ascii_case("FAILED") || status.eq_ignore_ascii_case("ERROR") {
            Readiness::Failed
        } else {
            Readiness::Pending
        };
        Some(readiness)
    }
}

/// `has_markdown: bool`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownFlagAdapter;

impl ReadinessAdapter for MarkdownFlagAdapter {
    fn readiness(&self, record: &CompanyRecord) -> Option<Readiness> {
        record.has_markdown.map(|ready| {
            if ready {
                Readiness::Ready
            } else {
                Readiness::Processing
            }
        })
    }
}

/// How a stored report is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ReportSourceKind {
    /// `GET /companies/{id}/report` returns `{markdown}`, rendered via `/reports/generate-pdf`.
    #[default]
    Markdown,
    /// `GET /report/{id}?format=pdf` returns the PDF directly.
    Pdf,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{CompanyRecord, Readiness};

    #[test]
    fn status_enum_schema() {
        let record: CompanyRecord = serde_json::from_str(
            r#"{"id":"1","name":"Acme","corporate_identity_number":"U123","website_link":null,
                "created_at":"2024-01-15T10:00:00Z","processing_status":"PROCESSING"}"#,
        )
        .unwrap();
        assert_eq!(record.readiness(), Readiness::Processing);
        assert_eq!(record.corporate_identity_number, "U123");
    }

    #[test]
    fn markdown_flag_schema_with_legacy_names() {
        let record: CompanyRecord = serde_json::from_str(
            r#"{"id":"65a1","name":"Acme","uin":"U123","uploadDate":"2024-01-15","hasMarkdown":true}"#,
        )
        .unwrap();
        assert_eq!(record.readiness(), Readiness::Ready);
        assert_eq!(record.created_at, "2024-01-15");
    }

    #[test]
    fn status_field_wins_over_flag() {
        let record: CompanyRecord = serde_json::from_str(
            r#"{"id":7,"name":"Acme","status":"failed","hasMarkdown":true}"#,
        )
        .unwrap();
        assert_eq!(record.id, "7");
        assert_eq!(record.readiness(), Readiness::Failed);
    }

    #[test]
    fn record_without_readiness_is_pending() {
        let record: CompanyRecord =
            serde_json::from_str(r#"{"id":"1","name":"Acme"}"#).unwrap();
        assert_eq!(record.readiness(), Readiness::Pending);
    }
}
