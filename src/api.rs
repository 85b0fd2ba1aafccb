mod client;
mod download;
mod helpers;
mod requests;
mod types;

pub use client::JobApiClient;
pub use download::{download_to_dir, DownloadProgress, DownloadProgressSender};
pub use helpers::format_file_size;
pub use types::{FileEntry, LogEntry};
