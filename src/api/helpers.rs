use reqwest::Url;

use crate::types::WizardError;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Validate the configured base URL and strip any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String, WizardError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|err| WizardError::Config(format!("Invalid API base URL `{raw}`: {err}")))?;
    if parsed.cannot_be_a_base() {
        return Err(WizardError::Config(format!(
            "API base URL `{raw}` cannot carry a path"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Human readable size with base-1024 units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}
