use std::path::Path;

/// File filter for module extensions
#[derive(Debug, Clone)]
pub struct FileFilter {
    extensions: Vec<String>,
}

impl FileFilter {
    /// Create new filter with extensions
    pub fn new<S: AsRef<str>>(extensions: impl IntoIterator<Item = S>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|s| s.as_ref().trim_start_matches('.').to_string())
                .collect(),
        }
    }

    /// Check if file passes filter
    pub fn matches(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            if let Some(ext_str) = ext.to_str() {
                return self.extensions.iter().any(|e| e == ext_str);
            }
        }
        false
    }
}
