//! Streams a result file from `GET /api/download/{name}` to disk.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Sender;
use tracing::info;

use crate::types::WizardError;

use super::JobApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    pub fn percent(&self) -> Option<u8> {
        self.total_bytes.map(|total| {
            if total == 0 {
                100
            } else {
                let percent = (self.downloaded_bytes.saturating_mul(100)) / total;
                percent.min(100) as u8
            }
        })
    }
}

pub type DownloadProgressSender = Sender<DownloadProgress>;

/// Download `file_name` into `directory`, returning the written path.
pub async fn download_to_dir(
    api: &JobApiClient,
    file_name: &str,
    directory: &Path,
    progress_tx: Option<DownloadProgressSender>,
) -> Result<PathBuf, WizardError> {
    let local_name = safe_file_name(file_name)?;
    let url = api.download_url(file_name)?;
    let mut response = api.http().get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(WizardError::Rejected {
            path: format!("/api/download/{file_name}"),
            status,
            message: format!("{file_name} could not be downloaded ({status})"),
        });
    }

    fs::create_dir_all(directory).await?;
    let destination = directory.join(local_name);
    let mut file = File::create(&destination).await?;
    let mut downloaded_bytes: u64 = 0;
    let total_bytes = response.content_length();

    emit_progress(progress_tx.as_ref(), downloaded_bytes, total_bytes).await;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        downloaded_bytes = downloaded_bytes.saturating_add(chunk.len() as u64);
        emit_progress(progress_tx.as_ref(), downloaded_bytes, total_bytes).await;
    }

    file.flush().await?;
    info!(file = %destination.display(), bytes = downloaded_bytes, "Download finished");
    Ok(destination)
}

fn safe_file_name(file_name: &str) -> Result<&str, WizardError> {
    let trimmed = file_name.trim();
    let is_plain = !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !trimmed.contains(['/', '\\']);
    if is_plain {
        Ok(trimmed)
    } else {
        Err(WizardError::Validation(format!(
            "`{file_name}` is not a plain file name"
        )))
    }
}

async fn emit_progress(
    progress_tx: Option<&DownloadProgressSender>,
    downloaded_bytes: u64,
    total_bytes: Option<u64>,
) {
    if let Some(progress_tx) = progress_tx {
        let _ = progress_tx
            .send(DownloadProgress {
                downloaded_bytes,
                total_bytes,
            })
            .await;
    }
}
