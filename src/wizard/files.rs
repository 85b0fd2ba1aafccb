use serde::Serialize;

use crate::api::{format_file_size, FileEntry};

const SPREADSHEET_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// A result file as shown in the download panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileItem {
    pub name: String,
    pub size: String,
    pub modified: String,
    pub download_path: String,
}

impl From<&FileEntry> for FileItem {
    fn from(entry: &FileEntry) -> Self {
        Self {
            name: entry.name.clone(),
            size: format_file_size(entry.size),
            modified: entry.modified.clone(),
            download_path: format!("/api/download/{}", entry.name),
        }
    }
}

/// Result files split into intermediate (raw extraction) and processed output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileListing {
    pub intermediate: Vec<FileItem>,
    pub processed: Vec<FileItem>,
}

impl FileListing {
    pub fn partition(files: &[FileEntry]) -> Self {
        let (intermediate, processed): (Vec<&FileEntry>, Vec<&FileEntry>) =
            files.iter().partition(|file| is_intermediate(&file.name));
        Self {
            intermediate: intermediate.into_iter().map(FileItem::from).collect(),
            processed: processed.into_iter().map(FileItem::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intermediate.is_empty() && self.processed.is_empty()
    }
}

pub fn is_intermediate(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("_raw")
        || (name.contains("raw")
            && SPREADSHEET_EXTENSIONS
                .iter()
                .any(|extension| name.ends_with(extension)))
}
