//! Dataset files uploaded by admins.
//!
//! Files live on disk under the configured upload directory. Import
//! walks a chat-format JSONL file (one `{"messages": [...]}` object per
//! line) and loads each user/assistant pair into the Q&A corpus.

use crate::data::qa;
use crate::json::parse_json_with_context;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const PREVIEW_LINES: usize = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDataset {
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Deserialize)]
struct ChatLine {
    messages: Vec<ChatLineMessage>,
}

#[derive(Deserialize)]
struct ChatLineMessage {
    role: String,
    content: String,
}

/// Reject names that could escape the upload directory.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains(['/', '\\'])
        || name.contains("..")
        || name.starts_with('.')
    {
        bail!("invalid dataset name: {name:?}");
    }
    Ok(())
}

fn dataset_path(upload_dir: &Path, name: &str) -> PathBuf {
    upload_dir.join(name)
}

/// Write an uploaded dataset to disk, creating the directory on first use.
pub async fn save(upload_dir: &Path, name: &str, bytes: &[u8]) -> Result<StoredDataset> {
    validate_name(name)?;
    fs::create_dir_all(upload_dir)
        .await
        .context("failed to create upload directory")?;

    let path = dataset_path(upload_dir, name);
    let mut file = fs::File::create(&path)
        .await
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.flush().await.context("failed to flush dataset file")?;

    Ok(StoredDataset {
        name: name.to_string(),
        size_bytes: bytes.len() as u64,
        modified_at: Some(Utc::now()),
    })
}

/// List stored datasets, newest first.
pub async fn list(upload_dir: &Path) -> Result<Vec<StoredDataset>> {
    let mut datasets = Vec::new();

    let mut entries = match fs::read_dir(upload_dir).await {
        Ok(entries) => entries,
        // No uploads yet.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(datasets),
        Err(e) => return Err(e).context("failed to read upload directory"),
    };

    while let Some(entry) = entries.next_entry().await.context("failed to walk upload directory")? {
        let meta = entry.metadata().await.context("failed to stat dataset")?;
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let modified_at = meta.modified().ok().map(DateTime::<Utc>::from);
        datasets.push(StoredDataset {
            name,
            size_bytes: meta.len(),
            modified_at,
        });
    }

    datasets.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    Ok(datasets)
}

/// First lines of a dataset for the admin preview pane. `None` when the
/// file doesn't exist.
pub async fn preview(upload_dir: &Path, name: &str) -> Result<Option<Vec<String>>> {
    validate_name(name)?;
    let path = dataset_path(upload_dir, name);

    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };

    Ok(Some(
        content
            .lines()
            .take(PREVIEW_LINES)
            .map(str::to_string)
            .collect(),
    ))
}

/// Import a chat-format JSONL dataset into the Q&A corpus. Lines that
/// don't parse or lack a user/assistant pair are counted as skipped.
pub async fn import(pool: &PgPool, upload_dir: &Path, name: &str) -> Result<Option<ImportReport>> {
    validate_name(name)?;
    let path = dataset_path(upload_dir, name);

    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };

    let mut imported = 0;
    let mut skipped = 0;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((question, answer)) = extract_pair(line) else {
            skipped += 1;
            continue;
        };
        qa::create(pool, &question, &answer, None).await?;
        imported += 1;
    }

    Ok(Some(ImportReport { imported, skipped }))
}

/// Pull the first user message and the first assistant message after it.
fn extract_pair(line: &str) -> Option<(String, String)> {
    let parsed: ChatLine = parse_json_with_context(line).ok()?;

    let mut question = None;
    for message in parsed.messages {
        match message.role.as_str() {
            "user" if question.is_none() => question = Some(message.content),
            "assistant" => {
                if let Some(question) = question {
                    if question.trim().is_empty() || message.content.trim().is_empty() {
                        return None;
                    }
                    return Some((question, message.content));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_user_assistant_pair() {
        let line = r#"{"messages":[{"role":"system","content":"You are helpful."},{"role":"user","content":"What are the tuition fees?"},{"role":"assistant","content":"Fees are listed on the bursar page."}]}"#;
        let (q, a) = extract_pair(line).unwrap();
        assert_eq!(q, "What are the tuition fees?");
        assert_eq!(a, "Fees are listed on the bursar page.");
    }

    #[test]
    fn skips_lines_without_assistant_reply() {
        let line = r#"{"messages":[{"role":"user","content":"Hello?"}]}"#;
        assert!(extract_pair(line).is_none());
    }

    #[test]
    fn skips_malformed_json() {
        assert!(extract_pair("not json at all").is_none());
        assert!(extract_pair(r#"{"messages": "wrong shape"}"#).is_none());
        // Malformed lines with multibyte text are skipped, not fatal.
        assert!(extract_pair(r#"{"messages": !ééééééééééééééééé}"#).is_none());
    }

    #[test]
    fn skips_empty_content() {
        let line = r#"{"messages":[{"role":"user","content":"  "},{"role":"assistant","content":"hi"}]}"#;
        assert!(extract_pair(line).is_none());
    }

    #[test]
    fn rejects_traversal_names() {
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("a/b.jsonl").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("faq_v2.jsonl").is_ok());
    }
}
