use serde::{Deserialize, Serialize};

/// Body of a rejected request: `{"error": "..."}`.
#[derive(Debug, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CredentialsStatus {
    #[serde(default)]
    pub has_credentials: bool,
}

#[derive(Debug, Deserialize)]
pub struct SchoolSelected {
    #[serde(default)]
    pub school: Option<NamedItem>,
}

#[derive(Debug, Deserialize)]
pub struct NamedItem {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClassSelected {
    #[serde(default)]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct FilesResponse {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}
