use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps company ids to original DRHP files kept in a static directory.
///
/// Only a handful of companies have an entry; the table comes from configuration.
#[derive(Debug, Clone, Default)]
pub struct SourceDocumentTable {
    static_dir: PathBuf,
    entries: HashMap<String, String>,
}

impl SourceDocumentTable {
    pub fn new(static_dir: PathBuf, entries: HashMap<String, String>) -> Self {
        Self {
            static_dir,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the company's source PDF, if mapped and present on disk.
    pub fn locate(&self, company_id: &str) -> Option<PathBuf> {
        let file_name = self.entries.get(company_id)?;
        if Path::new(file_name).file_name().and_then(|name| name.to_str())
            != Some(file_name.as_str())
        {
            return None;
        }
        let path = self.static_dir.join(file_name);
        path.is_file().then_some(path)
    }
}
