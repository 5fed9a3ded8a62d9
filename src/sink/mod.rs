//! Evaluation record sink.
//!
//! Extracted sections leave the crate as [`AnswerRecord`]s. Scoring itself happens
//! downstream; [`ScoringRequest`] pairs a record with its rendered question prompt.


use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::catalog::Question;
use crate::extract::ExtractionResult;
use crate::prompt::{PromptTemplate, TemplateError};

#[derive(Debug, Error)]
/// Errors returned by evaluation sinks.
pub enum SinkError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Question prompt could not be rendered.
    #[error("prompt error: {0}")]
    Template(#[from] TemplateError),
}

/// Convenience result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// An applicant's extracted answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub applicant_id: i64,
    pub q_id: String,
    pub header: String,
    pub answer_text: String,
    /// Unix timestamp (seconds).
    pub extracted_at: i64,
}

impl AnswerRecord {
    pub fn from_result(applicant_id: i64, q_id: impl Into<String>, result: &ExtractionResult) -> Self {
        Self {
            applicant_id,
            q_id: q_id.into(),
            header: result.header.clone(),
            answer_text: result.paragraph.clone(),
            extracted_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Input for the downstream scoring call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringRequest {
    pub record: AnswerRecord,
    pub prompt: String,
}

impl ScoringRequest {
    /// Renders `question`'s prompt with `{answer_text}` (required), `{header}` and `{q_id}`.
    pub fn build(record: AnswerRecord, question: &Question) -> SinkResult<Self> {
        let mut template = PromptTemplate::parse(&question.prompt_text());
        if template.requirement("answer_text").is_some() {
            template = template.require("answer_text")?;
        }

        let values: HashMap<&str, &str> = HashMap::from([
            ("answer_text", record.answer_text.as_str()),
            ("header", record.header.as_str()),
            ("q_id", record.q_id.as_str()),
        ]);
        let prompt = template.render(&values)?;

        Ok(Self { record, prompt })
    }
}

#[async_trait]
/// Receives answer records for scoring.
pub trait EvaluationSink: Send + Sync {
    async fn record(&self, record: AnswerRecord) -> SinkResult<()>;
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AnswerRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AnswerRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl EvaluationSink for MemorySink {
    async fn record(&self, record: AnswerRecord) -> SinkResult<()> {
        self.records.lock().push(record);
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EvaluationSink for JsonlSink {
    async fn record(&self, record: AnswerRecord) -> SinkResult<()> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), q_id = %record.q_id, "Answer record appended");
        Ok(())
    }
}
