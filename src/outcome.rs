//! Records the terminal outcome of each publish attempt.
//!
//! Logging is fire-and-forget: a failing sink is warned about and never replaces the
//! publish result.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::LingoError;
use crate::translation::Translation;

/// Whether the attempt went live.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Published
    Success,
    /// Something failed along the way
    Failed,
}

/// One publish attempt, as written to the outcome log.
#[derive(Clone, Debug, Serialize)]
pub struct OutcomeRecord {
    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
    /// Content that was on the card, when the caller knows it
    pub translation: Option<Translation>,
    /// Caption sent with the post
    pub caption: String,
    /// Hosted image, if the upload got that far
    pub image_url: Option<String>,
    /// Published media id, on success
    pub media_id: Option<String>,
    /// Final status
    pub status: OutcomeStatus,
    /// Error shown to the user, on failure
    pub error_message: Option<String>,
}

impl OutcomeRecord {
    /// A successful attempt
    pub fn success(
        translation: Option<&Translation>,
        caption: &str,
        image_url: &str,
        media_id: Option<&str>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            translation: translation.cloned(),
            caption: caption.to_string(),
            image_url: Some(image_url.to_string()),
            media_id: media_id.map(str::to_string),
            status: OutcomeStatus::Success,
            error_message: None,
        }
    }

    /// A failed attempt
    pub fn failure(
        translation: Option<&Translation>,
        caption: &str,
        image_url: Option<&str>,
        error: &LingoError,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            translation: translation.cloned(),
            caption: caption.to_string(),
            image_url: image_url.map(str::to_string),
            media_id: None,
            status: OutcomeStatus::Failed,
            error_message: Some(error.to_string()),
        }
    }
}

/// Somewhere to send outcome records.
#[async_trait]
pub trait OutcomeLogger: Send + Sync {
    /// Stores one record.
    async fn record(&self, record: &OutcomeRecord) -> Result<(), LingoError>;
}

/// Appends one JSON object per line to a file.
#[derive(Clone, Debug)]
pub struct JsonLinesLogger {
    path: PathBuf,
}

impl JsonLinesLogger {
    /// Logs to `path`, creating it on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where records go
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OutcomeLogger for JsonLinesLogger {
    async fn record(&self, record: &OutcomeRecord) -> Result<(), LingoError> {
        let mut line = serde_json::to_string(record).map_err(std::io::Error::other)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Emits records as log lines only.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

#[async_trait]
impl OutcomeLogger for TracingLogger {
    async fn record(&self, record: &OutcomeRecord) -> Result<(), LingoError> {
        info!(
            "outcome status={:?} word={:?} image_url={:?} media_id={:?} error={:?}",
            record.status,
            record
                .translation
                .as_ref()
                .map(|translation| translation.english.word.as_str()),
            record.image_url,
            record.media_id,
            record.error_message
        );
        Ok(())
    }
}

/// Sends `record` to `logger` once, downgrading any failure to a warning.
pub async fn record_outcome(logger: &dyn OutcomeLogger, record: &OutcomeRecord) {
    if let Err(err) = logger.record(record).await {
        warn!("Failed to record publish outcome: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::catalog;

    #[tokio::test]
    async fn json_lines_appends_one_record_per_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let logger = JsonLinesLogger::new(dir.path().join("outcomes.jsonl"));
        let translation = catalog().remove(0);

        let ok = OutcomeRecord::success(Some(&translation), "cap", "https://i.ibb.co/x.jpg", Some("m1"));
        let err = LingoError::UploadRejected("bad key".to_string());
        let failed = OutcomeRecord::failure(Some(&translation), "cap", None, &err);
        logger.record(&ok).await.expect("record ok");
        logger.record(&failed).await.expect("record failed");

        let contents = tokio::fs::read_to_string(logger.path())
            .await
            .expect("read log");
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["status"], "success");
        assert_eq!(lines[0]["media_id"], "m1");
        assert_eq!(lines[1]["status"], "failed");
        assert_eq!(lines[1]["image_url"], serde_json::Value::Null);
        assert_eq!(lines[1]["error_message"], "Image upload failed: bad key");
        assert_eq!(lines[1]["translation"]["catalan"]["word"], "Sortida del sol");
    }

    #[tokio::test]
    async fn unwritable_sink_is_swallowed() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a directory cannot be opened for append
        let logger = JsonLinesLogger::new(dir.path());
        let record = OutcomeRecord::success(Some(&catalog().remove(0)), "c", "u", None);
        assert!(logger.record(&record).await.is_err());
        record_outcome(&logger, &record).await;
        record_outcome(&TracingLogger, &record).await;
    }
}
